//! Shader-side layout rules and the field tables every uniform and vertex
//! type is checked against.
//!
//! The rules mirror the `simd` types used by Metal shaders: `float3` occupies
//! a full 16-byte slot, matrices are column-major `float4x4`, and a struct is
//! padded to the alignment of its widest member. Each layout type in the crate
//! declares its shader fields once through [`GpuLayout::FIELDS`]; the
//! [`check_layout!`] assertion then fails the build if the Rust struct drifts
//! from that table, and [`msl_declaration`] renders the shader-side struct
//! from the same table.

use std::fmt::Write as _;

use bytemuck::Pod;
use glam::{Mat4, Vec3};

use crate::variant::LayoutVariant;

/// Scalar, vector and matrix kinds a shader field can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Int,
    UInt,
    Float,
    Int2,
    Float2,
    Float3,
    Float4,
    Float4x4,
}

impl FieldKind {
    /// Size in bytes, including the padding lane of `float3`.
    pub const fn size(self) -> usize {
        match self {
            FieldKind::Int | FieldKind::UInt | FieldKind::Float => 4,
            FieldKind::Int2 | FieldKind::Float2 => 8,
            FieldKind::Float3 | FieldKind::Float4 => 16,
            FieldKind::Float4x4 => 64,
        }
    }

    pub const fn alignment(self) -> usize {
        match self {
            FieldKind::Int | FieldKind::UInt | FieldKind::Float => 4,
            FieldKind::Int2 | FieldKind::Float2 => 8,
            FieldKind::Float3 | FieldKind::Float4 | FieldKind::Float4x4 => 16,
        }
    }

    /// Type name used in the generated shader header.
    pub const fn msl_type(self) -> &'static str {
        match self {
            FieldKind::Int => "int",
            FieldKind::UInt => "uint",
            FieldKind::Float => "float",
            FieldKind::Int2 => "simd_int2",
            FieldKind::Float2 => "simd_float2",
            FieldKind::Float3 => "simd_float3",
            FieldKind::Float4 => "simd_float4",
            FieldKind::Float4x4 => "simd_float4x4",
        }
    }
}

/// One shader-side field. `count > 1` declares a fixed-size array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub count: usize,
}

impl Field {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            count: 1,
        }
    }

    pub const fn array(name: &'static str, kind: FieldKind, count: usize) -> Self {
        Self { name, kind, count }
    }

    pub const fn size(&self) -> usize {
        self.kind.size() * self.count
    }
}

/// A host-side struct whose bytes are consumed verbatim by a shader stage.
pub trait GpuLayout: Pod {
    /// Struct name on the shader side.
    const SHADER_NAME: &'static str;
    /// Shader-side fields in declaration order.
    const FIELDS: &'static [Field];
    const VARIANT: LayoutVariant;
}

const fn align_up(value: usize, alignment: usize) -> usize {
    (value + alignment - 1) / alignment * alignment
}

/// Byte offset of `fields[index]` under the shader layout rules.
pub const fn field_offset(fields: &[Field], index: usize) -> usize {
    let mut offset = 0;
    let mut i = 0;
    while i < index {
        offset = align_up(offset, fields[i].kind.alignment()) + fields[i].size();
        i += 1;
    }
    align_up(offset, fields[index].kind.alignment())
}

pub const fn struct_alignment(fields: &[Field]) -> usize {
    let mut alignment = 1;
    let mut i = 0;
    while i < fields.len() {
        if fields[i].kind.alignment() > alignment {
            alignment = fields[i].kind.alignment();
        }
        i += 1;
    }
    alignment
}

/// Total struct size, i.e. the array stride of the struct on the shader side.
pub const fn struct_size(fields: &[Field]) -> usize {
    if fields.is_empty() {
        return 0;
    }
    let last = fields.len() - 1;
    let end = field_offset(fields, last) + fields[last].size();
    align_up(end, struct_alignment(fields))
}

/// Pairs every field with its byte offset.
pub fn field_offsets(fields: &'static [Field]) -> Vec<(Field, usize)> {
    (0..fields.len())
        .map(|index| (fields[index], field_offset(fields, index)))
        .collect()
}

/// Renders the shader-side declaration of a struct.
pub fn msl_declaration(name: &str, fields: &[Field]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "struct {name} {{");
    for field in fields {
        let _ = if field.count > 1 {
            writeln!(
                out,
                "    {} {}[{}];",
                field.kind.msl_type(),
                field.name,
                field.count
            )
        } else {
            writeln!(out, "    {} {};", field.kind.msl_type(), field.name)
        };
    }
    out.push_str("};\n");
    out
}

/// Asserts at compile time that a struct's size and field offsets match its
/// `GpuLayout::FIELDS` table. Fields are listed in table order; padding
/// members are omitted.
macro_rules! check_layout {
    ($ty:ty { $($field:ident),+ $(,)? }) => {
        const _: () = {
            let fields = <$ty as $crate::layout::GpuLayout>::FIELDS;
            assert!(
                ::core::mem::size_of::<$ty>() == $crate::layout::struct_size(fields),
                "struct size differs from the shader layout"
            );
            let mut index = 0;
            $(
                assert!(
                    ::core::mem::offset_of!($ty, $field)
                        == $crate::layout::field_offset(fields, index),
                    "field offset differs from the shader layout"
                );
                index += 1;
            )+
            assert!(index == fields.len(), "field table and struct disagree on field count");
        };
    };
}

pub(crate) use check_layout;

pub(crate) fn float3_slot(value: Vec3) -> [f32; 4] {
    value.extend(0.0).to_array()
}

pub(crate) fn slot_vec3(slot: [f32; 4]) -> Vec3 {
    Vec3::new(slot[0], slot[1], slot[2])
}

pub(crate) fn matrix(columns: &[[f32; 4]; 4]) -> Mat4 {
    Mat4::from_cols_array_2d(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIXED: &[Field] = &[
        Field::new("count", FieldKind::Int),
        Field::new("transform", FieldKind::Float4x4),
        Field::new("uv", FieldKind::Float2),
        Field::new("normal", FieldKind::Float3),
        Field::new("scale", FieldKind::Float),
    ];

    #[test]
    fn offsets_follow_alignment() {
        assert_eq!(field_offset(MIXED, 0), 0);
        assert_eq!(field_offset(MIXED, 1), 16);
        assert_eq!(field_offset(MIXED, 2), 80);
        assert_eq!(field_offset(MIXED, 3), 96);
        assert_eq!(field_offset(MIXED, 4), 112);
    }

    #[test]
    fn size_rounds_up_to_widest_member() {
        assert_eq!(struct_alignment(MIXED), 16);
        assert_eq!(struct_size(MIXED), 128);

        let pair = &[Field::new("size", FieldKind::Int2)];
        assert_eq!(struct_alignment(pair), 8);
        assert_eq!(struct_size(pair), 8);
    }

    #[test]
    fn arrays_multiply_the_element_size() {
        let fields = &[
            Field::array("positions", FieldKind::Float3, 2),
            Field::new("angle", FieldKind::Float),
        ];
        assert_eq!(field_offset(fields, 1), 32);
        assert_eq!(struct_size(fields), 48);
    }

    #[test]
    fn declaration_lists_fields_in_order() {
        let text = msl_declaration(
            "Sample",
            &[
                Field::new("viewCount", FieldKind::Int),
                Field::array("positionInView", FieldKind::Float3, 2),
            ],
        );
        assert_eq!(
            text,
            "struct Sample {\n    int viewCount;\n    simd_float3 positionInView[2];\n};\n"
        );
    }

    #[test]
    fn float3_slot_zeroes_the_padding_lane() {
        let slot = float3_slot(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(slot, [1.0, 2.0, 3.0, 0.0]);
        assert_eq!(slot_vec3(slot), Vec3::new(1.0, 2.0, 3.0));
    }
}

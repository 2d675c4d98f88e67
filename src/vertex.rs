//! Per-vertex records and the variant-tagged buffers that carry them.
//!
//! A pipeline is compiled against exactly one vertex layout. [`Vertex`] feeds
//! lit passes that need the full tangent frame; [`MaskedVertex`] feeds depth
//! and stencil passes that only need a position and a bitmask. The two
//! strides differ, so a [`VertexBuffer`] refuses to be read or bound as the
//! other layout.

use std::mem::{offset_of, size_of};

use bytemuck::{cast_slice, Pod, Zeroable};
use glam::{Vec2, Vec3};
use log::debug;

use crate::error::LayoutError;
use crate::layout::{check_layout, float3_slot, slot_vec3, Field, FieldKind, GpuLayout};
use crate::variant::{Binding, LayoutVariant};

/// A vertex layout together with its vertex-stage attribute table.
pub trait VertexLayout: GpuLayout {
    const ATTRIBUTES: &'static [wgpu::VertexAttribute];

    fn buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: Self::ATTRIBUTES,
        }
    }
}

/// Position with texture coordinates and tangent frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 4],
    pub uv: [f32; 2],
    _pad0: [f32; 2],
    pub normal: [f32; 4],
    pub tangent: [f32; 4],
    pub bitangent: [f32; 4],
}

impl GpuLayout for Vertex {
    const SHADER_NAME: &'static str = "Vertex";
    const FIELDS: &'static [Field] = &[
        Field::new("position", FieldKind::Float3),
        Field::new("uv", FieldKind::Float2),
        Field::new("normal", FieldKind::Float3),
        Field::new("tangent", FieldKind::Float3),
        Field::new("bitangent", FieldKind::Float3),
    ];
    const VARIANT: LayoutVariant = LayoutVariant::Vertex;
}

check_layout!(Vertex {
    position,
    uv,
    normal,
    tangent,
    bitangent,
});

impl VertexLayout for Vertex {
    const ATTRIBUTES: &'static [wgpu::VertexAttribute] = &[
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: offset_of!(Vertex, position) as wgpu::BufferAddress,
            shader_location: 0,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: offset_of!(Vertex, uv) as wgpu::BufferAddress,
            shader_location: 1,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: offset_of!(Vertex, normal) as wgpu::BufferAddress,
            shader_location: 2,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: offset_of!(Vertex, tangent) as wgpu::BufferAddress,
            shader_location: 3,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: offset_of!(Vertex, bitangent) as wgpu::BufferAddress,
            shader_location: 4,
        },
    ];
}

impl Vertex {
    pub fn new(position: Vec3, uv: Vec2, normal: Vec3, tangent: Vec3, bitangent: Vec3) -> Self {
        Self {
            position: float3_slot(position),
            uv: uv.to_array(),
            _pad0: [0.0; 2],
            normal: float3_slot(normal),
            tangent: float3_slot(tangent),
            bitangent: float3_slot(bitangent),
        }
    }

    pub fn position(&self) -> Vec3 {
        slot_vec3(self.position)
    }

    pub fn normal(&self) -> Vec3 {
        slot_vec3(self.normal)
    }

    /// Interleaves attribute streams into vertices. Missing streams are
    /// zero-filled; present ones must match the position count.
    pub fn pack(attributes: &VertexAttributes<'_>) -> Result<Vec<Self>, LayoutError> {
        let count = attributes.positions.len();
        check_stream("uv", count, attributes.uvs)?;
        check_stream("normal", count, attributes.normals)?;
        check_stream("tangent", count, attributes.tangents)?;
        check_stream("bitangent", count, attributes.bitangents)?;
        debug!(
            "packing {count} vertices (uv: {}, normal: {}, tangent: {}, bitangent: {})",
            attributes.uvs.is_some(),
            attributes.normals.is_some(),
            attributes.tangents.is_some(),
            attributes.bitangents.is_some()
        );

        let pick3 = |stream: Option<&[Vec3]>, index: usize| {
            stream.map_or(Vec3::ZERO, |values| values[index])
        };
        Ok(attributes
            .positions
            .iter()
            .enumerate()
            .map(|(index, position)| {
                Self::new(
                    *position,
                    attributes.uvs.map_or(Vec2::ZERO, |uvs| uvs[index]),
                    pick3(attributes.normals, index),
                    pick3(attributes.tangents, index),
                    pick3(attributes.bitangents, index),
                )
            })
            .collect())
    }
}

/// Attribute streams of one mesh part. Only positions are required.
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexAttributes<'a> {
    pub positions: &'a [Vec3],
    pub uvs: Option<&'a [Vec2]>,
    pub normals: Option<&'a [Vec3]>,
    pub tangents: Option<&'a [Vec3]>,
    pub bitangents: Option<&'a [Vec3]>,
}

impl<'a> VertexAttributes<'a> {
    pub fn new(positions: &'a [Vec3]) -> Self {
        Self {
            positions,
            ..Self::default()
        }
    }
}

/// Position plus a pass-specific bitmask.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct MaskedVertex {
    pub position: [f32; 4],
    pub mask: u32,
    _pad0: [u32; 3],
}

impl GpuLayout for MaskedVertex {
    const SHADER_NAME: &'static str = "MaskedVertex";
    const FIELDS: &'static [Field] = &[
        Field::new("position", FieldKind::Float3),
        Field::new("mask", FieldKind::UInt),
    ];
    const VARIANT: LayoutVariant = LayoutVariant::MaskedVertex;
}

check_layout!(MaskedVertex { position, mask });

impl VertexLayout for MaskedVertex {
    const ATTRIBUTES: &'static [wgpu::VertexAttribute] = &[
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: offset_of!(MaskedVertex, position) as wgpu::BufferAddress,
            shader_location: 0,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Uint32,
            offset: offset_of!(MaskedVertex, mask) as wgpu::BufferAddress,
            shader_location: 1,
        },
    ];
}

impl MaskedVertex {
    pub fn new(position: Vec3, mask: u32) -> Self {
        Self {
            position: float3_slot(position),
            mask,
            _pad0: [0; 3],
        }
    }

    pub fn position(&self) -> Vec3 {
        slot_vec3(self.position)
    }

    pub fn pack(positions: &[Vec3], masks: &[u32]) -> Result<Vec<Self>, LayoutError> {
        check_stream("mask", positions.len(), Some(masks))?;
        Ok(positions
            .iter()
            .zip(masks)
            .map(|(position, mask)| Self::new(*position, *mask))
            .collect())
    }
}

fn check_stream<T>(
    attribute: &'static str,
    expected: usize,
    stream: Option<&[T]>,
) -> Result<(), LayoutError> {
    match stream {
        Some(values) if values.len() != expected => Err(LayoutError::AttributeCountMismatch {
            attribute,
            expected,
            found: values.len(),
        }),
        _ => Ok(()),
    }
}

/// Vertex bytes tagged with the layout they were written in.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexBuffer {
    variant: LayoutVariant,
    bytes: Vec<u8>,
}

impl VertexBuffer {
    pub fn from_vertices<V: VertexLayout>(vertices: &[V]) -> Self {
        Self {
            variant: V::VARIANT,
            bytes: cast_slice::<V, u8>(vertices).to_vec(),
        }
    }

    /// Wraps raw bytes that claim to hold `variant` records. Only vertex
    /// layouts are accepted.
    pub fn from_bytes(variant: LayoutVariant, bytes: Vec<u8>) -> Result<Self, LayoutError> {
        if variant.binding() != Binding::VertexBuffer {
            return Err(LayoutError::NotVertexLayout(variant));
        }
        let stride = variant.size();
        if bytes.len() % stride != 0 {
            return Err(LayoutError::SizeMismatch {
                variant,
                len: bytes.len(),
                stride,
            });
        }
        Ok(Self { variant, bytes })
    }

    pub fn variant(&self) -> LayoutVariant {
        self.variant
    }

    pub fn stride(&self) -> usize {
        self.variant.size()
    }

    pub fn len(&self) -> usize {
        self.bytes.len() / self.stride()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bytes for a pipeline compiled against `pipeline` vertices.
    pub fn bind_as(&self, pipeline: LayoutVariant) -> Result<&[u8], LayoutError> {
        if pipeline != self.variant {
            return Err(LayoutError::VariantMismatch {
                buffer: self.variant,
                buffer_stride: self.stride(),
                expected: pipeline,
                expected_stride: pipeline.size(),
            });
        }
        Ok(&self.bytes)
    }

    /// Copies the records back out, provided they were written as `V`.
    pub fn read<V: VertexLayout>(&self) -> Result<Vec<V>, LayoutError> {
        let bytes = self.bind_as(V::VARIANT)?;
        Ok(bytemuck::pod_collect_to_vec(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn strides_match_the_shader_layout() {
        assert_eq!(size_of::<Vertex>(), 80);
        assert_eq!(size_of::<MaskedVertex>(), 32);
        assert_eq!(Vertex::buffer_layout().array_stride, 80);
        assert_eq!(MaskedVertex::buffer_layout().attributes[1].offset, 16);
        assert_eq!(Vertex::ATTRIBUTES[2].offset, 32);
    }

    #[test]
    fn pack_fills_missing_streams_with_zero() {
        let positions = triangle();
        let normals = vec![Vec3::Z; 3];
        let attributes = VertexAttributes {
            normals: Some(&normals),
            ..VertexAttributes::new(&positions)
        };
        let vertices = Vertex::pack(&attributes).unwrap();
        assert_eq!(vertices.len(), 3);
        assert_eq!(vertices[1].position(), Vec3::X);
        assert_eq!(vertices[2].normal(), Vec3::Z);
        assert_eq!(vertices[0].uv, [0.0, 0.0]);
        assert_eq!(vertices[0].tangent, [0.0; 4]);
    }

    #[test]
    fn pack_rejects_short_streams() {
        let positions = triangle();
        let uvs = vec![Vec2::ZERO; 2];
        let attributes = VertexAttributes {
            uvs: Some(&uvs),
            ..VertexAttributes::new(&positions)
        };
        assert_eq!(
            Vertex::pack(&attributes),
            Err(LayoutError::AttributeCountMismatch {
                attribute: "uv",
                expected: 3,
                found: 2
            })
        );
        assert!(MaskedVertex::pack(&positions, &[1, 2]).is_err());
    }

    #[test]
    fn swapped_variants_are_detected() {
        let positions = triangle();
        let masked = MaskedVertex::pack(&positions, &[1, 2, 4]).unwrap();
        let buffer = VertexBuffer::from_vertices(&masked);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.read::<MaskedVertex>().unwrap(), masked);

        let err = buffer.read::<Vertex>().unwrap_err();
        assert_eq!(
            err,
            LayoutError::VariantMismatch {
                buffer: LayoutVariant::MaskedVertex,
                buffer_stride: 32,
                expected: LayoutVariant::Vertex,
                expected_stride: 80,
            }
        );

        let full = Vertex::pack(&VertexAttributes::new(&positions)).unwrap();
        let buffer = VertexBuffer::from_vertices(&full);
        assert!(buffer.bind_as(LayoutVariant::MaskedVertex).is_err());
        assert_eq!(buffer.bind_as(LayoutVariant::Vertex).unwrap().len(), 240);
    }

    #[test]
    fn raw_bytes_must_hold_whole_records() {
        let err = VertexBuffer::from_bytes(LayoutVariant::Vertex, vec![0; 96]).unwrap_err();
        assert_eq!(
            err,
            LayoutError::SizeMismatch {
                variant: LayoutVariant::Vertex,
                len: 96,
                stride: 80
            }
        );
        let buffer = VertexBuffer::from_bytes(LayoutVariant::MaskedVertex, vec![0; 96]).unwrap();
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn uniform_layouts_are_not_vertex_buffers() {
        assert_eq!(
            VertexBuffer::from_bytes(LayoutVariant::Frame, vec![0; 448]),
            Err(LayoutError::NotVertexLayout(LayoutVariant::Frame))
        );
        assert_eq!(
            VertexBuffer::from_bytes(LayoutVariant::VolumeSpotLight, vec![0; 272]),
            Err(LayoutError::NotVertexLayout(LayoutVariant::VolumeSpotLight))
        );
        let buffer = VertexBuffer::from_vertices(&[Vertex::default()]);
        assert!(buffer.bind_as(LayoutVariant::Frame).is_err());
    }
}

//! The closed set of layouts exchanged with shaders, and the shader header
//! generated from them.

use std::fmt;
use std::mem::size_of;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::fragment::FragmentUniforms;
use crate::frame::{EyeFrameUniforms, FrameUniforms, ProjectionUniforms};
use crate::layout::{msl_declaration, struct_alignment, Field, GpuLayout};
use crate::light::{SurfaceLightUniforms, VolumeSpotLight};
use crate::vertex::{MaskedVertex, Vertex};
use crate::view::{ModelViewUniforms, ViewUniforms};

/// Every layout variant. Each is an independent contract with its own
/// shader struct name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutVariant {
    Frame,
    EyeFrame,
    ProjectionFrame,
    View,
    ModelView,
    Fragment,
    Vertex,
    MaskedVertex,
    VolumeSpotLight,
    SurfaceLight,
}

/// Where a layout is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// One struct per draw.
    Uniform,
    /// Two structs, indexed by view.
    PerView,
    /// A packed array with a separate count.
    Array,
    /// Per-vertex records.
    VertexBuffer,
}

impl LayoutVariant {
    pub const ALL: [LayoutVariant; 10] = [
        LayoutVariant::Frame,
        LayoutVariant::EyeFrame,
        LayoutVariant::ProjectionFrame,
        LayoutVariant::View,
        LayoutVariant::ModelView,
        LayoutVariant::Fragment,
        LayoutVariant::Vertex,
        LayoutVariant::MaskedVertex,
        LayoutVariant::VolumeSpotLight,
        LayoutVariant::SurfaceLight,
    ];

    /// Identifier used on the command line and in serialized data.
    pub fn key(self) -> &'static str {
        match self {
            LayoutVariant::Frame => "frame",
            LayoutVariant::EyeFrame => "eye-frame",
            LayoutVariant::ProjectionFrame => "projection-frame",
            LayoutVariant::View => "view",
            LayoutVariant::ModelView => "model-view",
            LayoutVariant::Fragment => "fragment",
            LayoutVariant::Vertex => "vertex",
            LayoutVariant::MaskedVertex => "masked-vertex",
            LayoutVariant::VolumeSpotLight => "volume-spot-light",
            LayoutVariant::SurfaceLight => "surface-light",
        }
    }

    pub fn shader_name(self) -> &'static str {
        match self {
            LayoutVariant::Frame => FrameUniforms::SHADER_NAME,
            LayoutVariant::EyeFrame => EyeFrameUniforms::SHADER_NAME,
            LayoutVariant::ProjectionFrame => ProjectionUniforms::SHADER_NAME,
            LayoutVariant::View => ViewUniforms::SHADER_NAME,
            LayoutVariant::ModelView => ModelViewUniforms::SHADER_NAME,
            LayoutVariant::Fragment => FragmentUniforms::SHADER_NAME,
            LayoutVariant::Vertex => Vertex::SHADER_NAME,
            LayoutVariant::MaskedVertex => MaskedVertex::SHADER_NAME,
            LayoutVariant::VolumeSpotLight => VolumeSpotLight::SHADER_NAME,
            LayoutVariant::SurfaceLight => SurfaceLightUniforms::SHADER_NAME,
        }
    }

    pub fn fields(self) -> &'static [Field] {
        match self {
            LayoutVariant::Frame => FrameUniforms::FIELDS,
            LayoutVariant::EyeFrame => EyeFrameUniforms::FIELDS,
            LayoutVariant::ProjectionFrame => ProjectionUniforms::FIELDS,
            LayoutVariant::View => ViewUniforms::FIELDS,
            LayoutVariant::ModelView => ModelViewUniforms::FIELDS,
            LayoutVariant::Fragment => FragmentUniforms::FIELDS,
            LayoutVariant::Vertex => Vertex::FIELDS,
            LayoutVariant::MaskedVertex => MaskedVertex::FIELDS,
            LayoutVariant::VolumeSpotLight => VolumeSpotLight::FIELDS,
            LayoutVariant::SurfaceLight => SurfaceLightUniforms::FIELDS,
        }
    }

    /// Host-side size in bytes, equal to the shader-side stride.
    pub fn size(self) -> usize {
        match self {
            LayoutVariant::Frame => size_of::<FrameUniforms>(),
            LayoutVariant::EyeFrame => size_of::<EyeFrameUniforms>(),
            LayoutVariant::ProjectionFrame => size_of::<ProjectionUniforms>(),
            LayoutVariant::View => size_of::<ViewUniforms>(),
            LayoutVariant::ModelView => size_of::<ModelViewUniforms>(),
            LayoutVariant::Fragment => size_of::<FragmentUniforms>(),
            LayoutVariant::Vertex => size_of::<Vertex>(),
            LayoutVariant::MaskedVertex => size_of::<MaskedVertex>(),
            LayoutVariant::VolumeSpotLight => size_of::<VolumeSpotLight>(),
            LayoutVariant::SurfaceLight => size_of::<SurfaceLightUniforms>(),
        }
    }

    /// Alignment the shader side expects for the struct.
    pub fn alignment(self) -> usize {
        struct_alignment(self.fields())
    }

    pub fn binding(self) -> Binding {
        match self {
            LayoutVariant::Frame
            | LayoutVariant::EyeFrame
            | LayoutVariant::ProjectionFrame
            | LayoutVariant::Fragment => Binding::Uniform,
            LayoutVariant::View | LayoutVariant::ModelView | LayoutVariant::SurfaceLight => {
                Binding::PerView
            }
            LayoutVariant::VolumeSpotLight => Binding::Array,
            LayoutVariant::Vertex | LayoutVariant::MaskedVertex => Binding::VertexBuffer,
        }
    }

    pub fn declaration(self) -> String {
        msl_declaration(self.shader_name(), self.fields())
    }
}

impl fmt::Display for LayoutVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for LayoutVariant {
    type Err = LayoutError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        LayoutVariant::ALL
            .into_iter()
            .find(|variant| variant.key() == value || variant.shader_name() == value)
            .ok_or_else(|| LayoutError::UnknownVariant(value.to_string()))
    }
}

/// Shader header declaring the given layouts, in order.
pub fn shader_header(variants: &[LayoutVariant]) -> String {
    let mut header = String::from("#import <simd/simd.h>\n");
    for variant in variants {
        header.push('\n');
        header.push_str(&variant.declaration());
    }
    header
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::struct_size;

    #[test]
    fn sizes_agree_with_field_tables() {
        for variant in LayoutVariant::ALL {
            assert_eq!(
                variant.size(),
                struct_size(variant.fields()),
                "{variant} size"
            );
        }
    }

    #[test]
    fn expected_sizes() {
        let sizes: Vec<_> = LayoutVariant::ALL.iter().map(|v| v.size()).collect();
        assert_eq!(sizes, vec![448, 384, 208, 256, 400, 8, 80, 32, 272, 208]);
        assert_eq!(LayoutVariant::Fragment.alignment(), 8);
        assert_eq!(LayoutVariant::VolumeSpotLight.alignment(), 16);
    }

    #[test]
    fn shader_names_are_unique() {
        let mut names: Vec<_> = LayoutVariant::ALL.iter().map(|v| v.shader_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), LayoutVariant::ALL.len());
    }

    #[test]
    fn parses_keys_and_shader_names() {
        assert_eq!("eye-frame".parse(), Ok(LayoutVariant::EyeFrame));
        assert_eq!("VolumeSpotLight".parse(), Ok(LayoutVariant::VolumeSpotLight));
        assert_eq!(
            "bogus".parse::<LayoutVariant>(),
            Err(LayoutError::UnknownVariant("bogus".into()))
        );
        for variant in LayoutVariant::ALL {
            assert_eq!(variant.to_string().parse(), Ok(variant));
        }
    }

    #[test]
    fn header_declares_requested_structs() {
        let header = shader_header(&[LayoutVariant::Fragment, LayoutVariant::MaskedVertex]);
        assert!(header.starts_with("#import <simd/simd.h>\n"));
        assert!(header.contains("struct FragmentUniforms {\n    simd_int2 textureSize;\n};"));
        assert!(header.contains("    uint mask;\n"));
        assert!(!header.contains("VolumeSpotLight"));
    }
}

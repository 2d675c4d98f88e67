use bytemuck::{Pod, Zeroable};

use crate::layout::{check_layout, Field, FieldKind, GpuLayout};
use crate::variant::LayoutVariant;

/// Size of the render target the fragment stage writes to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct FragmentUniforms {
    pub texture_size: [i32; 2],
}

impl GpuLayout for FragmentUniforms {
    const SHADER_NAME: &'static str = "FragmentUniforms";
    const FIELDS: &'static [Field] = &[Field::new("textureSize", FieldKind::Int2)];
    const VARIANT: LayoutVariant = LayoutVariant::Fragment;
}

check_layout!(FragmentUniforms { texture_size });

impl FragmentUniforms {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            texture_size: [clamp_extent(width), clamp_extent(height)],
        }
    }

    pub fn texture_size(&self) -> (i32, i32) {
        (self.texture_size[0], self.texture_size[1])
    }
}

fn clamp_extent(extent: u32) -> i32 {
    i32::try_from(extent).unwrap_or(i32::MAX)
}

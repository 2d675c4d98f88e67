//! Per-frame camera and projection uniforms shared by every draw call.

use bytemuck::{bytes_of, Pod, Zeroable};
use glam::Mat4;

use crate::layout::{check_layout, matrix, Field, FieldKind, GpuLayout};
use crate::rig::ViewSet;
use crate::variant::LayoutVariant;

/// Rows of the RGBA32F texture the frame matrices are blitted into; one row
/// holds one `float4x4`.
pub const UNIFORM_TEXTURE_ROWS: usize = 5;
/// Bytes in one row of the uniform texture (4 RGBA32F texels).
pub const UNIFORM_TEXTURE_ROW_BYTES: usize = 64;

/// Centre camera, both eye cameras, and both projections with inverses.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub camera_transform: [[f32; 4]; 4],
    pub camera_transform_left: [[f32; 4]; 4],
    pub camera_transform_right: [[f32; 4]; 4],
    pub projection0: [[f32; 4]; 4],
    pub projection1: [[f32; 4]; 4],
    pub projection0_inverse: [[f32; 4]; 4],
    pub projection1_inverse: [[f32; 4]; 4],
}

impl GpuLayout for FrameUniforms {
    const SHADER_NAME: &'static str = "FrameUniforms";
    const FIELDS: &'static [Field] = &[
        Field::new("cameraTransform", FieldKind::Float4x4),
        Field::new("cameraTransformL", FieldKind::Float4x4),
        Field::new("cameraTransformR", FieldKind::Float4x4),
        Field::new("projection0", FieldKind::Float4x4),
        Field::new("projection1", FieldKind::Float4x4),
        Field::new("projection0Inverse", FieldKind::Float4x4),
        Field::new("projection1Inverse", FieldKind::Float4x4),
    ];
    const VARIANT: LayoutVariant = LayoutVariant::Frame;
}

check_layout!(FrameUniforms {
    camera_transform,
    camera_transform_left,
    camera_transform_right,
    projection0,
    projection1,
    projection0_inverse,
    projection1_inverse,
});

impl FrameUniforms {
    pub fn new(camera_transform: Mat4, views: &ViewSet) -> Self {
        let (left, right) = (views.left(), views.right());
        Self {
            camera_transform: camera_transform.to_cols_array_2d(),
            camera_transform_left: left.camera_transform.to_cols_array_2d(),
            camera_transform_right: right.camera_transform.to_cols_array_2d(),
            projection0: left.projection.to_cols_array_2d(),
            projection1: right.projection.to_cols_array_2d(),
            projection0_inverse: left.projection.inverse().to_cols_array_2d(),
            projection1_inverse: right.projection.inverse().to_cols_array_2d(),
        }
    }

    pub fn camera_transform(&self) -> Mat4 {
        matrix(&self.camera_transform)
    }

    pub fn camera_transform_left(&self) -> Mat4 {
        matrix(&self.camera_transform_left)
    }

    pub fn camera_transform_right(&self) -> Mat4 {
        matrix(&self.camera_transform_right)
    }

    pub fn projection(&self, index: usize) -> Mat4 {
        match index {
            0 => matrix(&self.projection0),
            _ => matrix(&self.projection1),
        }
    }

    pub fn projection_inverse(&self, index: usize) -> Mat4 {
        match index {
            0 => matrix(&self.projection0_inverse),
            _ => matrix(&self.projection1_inverse),
        }
    }

    /// Leading matrices laid out as rows of the uniform texture.
    pub fn texture_rows(&self, rows: usize) -> &[u8] {
        matrix_rows(bytes_of(self), rows)
    }
}

/// Eye cameras and projections without the centre camera.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct EyeFrameUniforms {
    pub camera_transform_left: [[f32; 4]; 4],
    pub camera_transform_right: [[f32; 4]; 4],
    pub projection0: [[f32; 4]; 4],
    pub projection1: [[f32; 4]; 4],
    pub projection0_inverse: [[f32; 4]; 4],
    pub projection1_inverse: [[f32; 4]; 4],
}

impl GpuLayout for EyeFrameUniforms {
    const SHADER_NAME: &'static str = "EyeFrameUniforms";
    const FIELDS: &'static [Field] = &[
        Field::new("cameraTransformL", FieldKind::Float4x4),
        Field::new("cameraTransformR", FieldKind::Float4x4),
        Field::new("projection0", FieldKind::Float4x4),
        Field::new("projection1", FieldKind::Float4x4),
        Field::new("projection0Inverse", FieldKind::Float4x4),
        Field::new("projection1Inverse", FieldKind::Float4x4),
    ];
    const VARIANT: LayoutVariant = LayoutVariant::EyeFrame;
}

check_layout!(EyeFrameUniforms {
    camera_transform_left,
    camera_transform_right,
    projection0,
    projection1,
    projection0_inverse,
    projection1_inverse,
});

impl EyeFrameUniforms {
    pub fn from_views(views: &ViewSet) -> Self {
        let (left, right) = (views.left(), views.right());
        Self {
            camera_transform_left: left.camera_transform.to_cols_array_2d(),
            camera_transform_right: right.camera_transform.to_cols_array_2d(),
            projection0: left.projection.to_cols_array_2d(),
            projection1: right.projection.to_cols_array_2d(),
            projection0_inverse: left.projection.inverse().to_cols_array_2d(),
            projection1_inverse: right.projection.inverse().to_cols_array_2d(),
        }
    }

    /// World-from-camera transform of an eye (0 = left, 1 = right).
    pub fn camera_transform(&self, index: usize) -> Mat4 {
        match index {
            0 => matrix(&self.camera_transform_left),
            _ => matrix(&self.camera_transform_right),
        }
    }

    pub fn projection(&self, index: usize) -> Mat4 {
        match index {
            0 => matrix(&self.projection0),
            _ => matrix(&self.projection1),
        }
    }

    pub fn projection_inverse(&self, index: usize) -> Mat4 {
        match index {
            0 => matrix(&self.projection0_inverse),
            _ => matrix(&self.projection1_inverse),
        }
    }

    pub fn texture_rows(&self, rows: usize) -> &[u8] {
        matrix_rows(bytes_of(self), rows)
    }
}

/// Single camera with up to two projections and the number in use.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ProjectionUniforms {
    pub camera_transform: [[f32; 4]; 4],
    pub projection_count: i32,
    _pad0: [i32; 3],
    pub projection0: [[f32; 4]; 4],
    pub projection1: [[f32; 4]; 4],
}

impl GpuLayout for ProjectionUniforms {
    const SHADER_NAME: &'static str = "ProjectionUniforms";
    const FIELDS: &'static [Field] = &[
        Field::new("cameraTransform", FieldKind::Float4x4),
        Field::new("projectionCount", FieldKind::Int),
        Field::new("projection0", FieldKind::Float4x4),
        Field::new("projection1", FieldKind::Float4x4),
    ];
    const VARIANT: LayoutVariant = LayoutVariant::ProjectionFrame;
}

check_layout!(ProjectionUniforms {
    camera_transform,
    projection_count,
    projection0,
    projection1,
});

impl ProjectionUniforms {
    /// `projection1` repeats `projection0` when only one view is active.
    pub fn new(camera_transform: Mat4, views: &ViewSet) -> Self {
        Self {
            camera_transform: camera_transform.to_cols_array_2d(),
            projection_count: views.count() as i32,
            _pad0: [0; 3],
            projection0: views.left().projection.to_cols_array_2d(),
            projection1: views.right().projection.to_cols_array_2d(),
        }
    }

    pub fn camera_transform(&self) -> Mat4 {
        matrix(&self.camera_transform)
    }

    pub fn projection(&self, index: usize) -> Mat4 {
        match index {
            0 => matrix(&self.projection0),
            _ => matrix(&self.projection1),
        }
    }
}

fn matrix_rows(bytes: &[u8], rows: usize) -> &[u8] {
    let len = (rows * UNIFORM_TEXTURE_ROW_BYTES).min(bytes.len());
    &bytes[..len]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::{default_stereo_projections, Rig, ViewPose};
    use glam::{Quat, Vec3};

    fn stereo_views() -> ViewSet {
        let device = Mat4::from_rotation_translation(
            Quat::from_rotation_y(0.3),
            Vec3::new(0.5, 1.6, -2.0),
        );
        Rig::default_stereo().views(device)
    }

    #[test]
    fn sizes_match_the_shader_declarations() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 7 * 64);
        assert_eq!(std::mem::size_of::<EyeFrameUniforms>(), 6 * 64);
        assert_eq!(std::mem::size_of::<ProjectionUniforms>(), 208);
        assert_eq!(std::mem::offset_of!(ProjectionUniforms, projection0), 80);
    }

    #[test]
    fn written_matrices_read_back_bit_identical() {
        let views = stereo_views();
        let camera = Mat4::from_translation(Vec3::new(0.1, 0.2, 0.3));
        let frame = FrameUniforms::new(camera, &views);
        assert_eq!(frame.camera_transform(), camera);
        assert_eq!(frame.camera_transform_left(), views.left().camera_transform);
        assert_eq!(frame.camera_transform_right(), views.right().camera_transform);
        assert_eq!(frame.projection(0), views.left().projection);
        assert_eq!(frame.projection(1), views.right().projection);

        let copy: FrameUniforms = bytemuck::pod_read_unaligned(bytes_of(&frame));
        assert_eq!(bytes_of(&copy), bytes_of(&frame));
    }

    #[test]
    fn inverses_undo_the_projections() {
        let frame = EyeFrameUniforms::from_views(&stereo_views());
        for index in 0..2 {
            let product = frame.projection(index) * frame.projection_inverse(index);
            assert!(product.abs_diff_eq(Mat4::IDENTITY, 1e-4));
        }
    }

    #[test]
    fn projection_count_tracks_active_views() {
        let mono = ViewSet::mono(ViewPose::new(Mat4::IDENTITY, default_stereo_projections()[0]));
        let uniforms = ProjectionUniforms::new(Mat4::IDENTITY, &mono);
        assert_eq!(uniforms.projection_count, 1);
        assert_eq!(uniforms.projection(1), uniforms.projection(0));

        let stereo = ProjectionUniforms::new(Mat4::IDENTITY, &stereo_views());
        assert_eq!(stereo.projection_count, 2);
        assert_ne!(stereo.projection(1), stereo.projection(0));
    }

    #[test]
    fn texture_rows_cover_leading_matrices() {
        let frame = FrameUniforms::new(Mat4::IDENTITY, &stereo_views());
        let rows = frame.texture_rows(UNIFORM_TEXTURE_ROWS);
        assert_eq!(rows.len(), UNIFORM_TEXTURE_ROWS * UNIFORM_TEXTURE_ROW_BYTES);
        assert_eq!(&rows[256..320], bytes_of(&frame.projection1));
        assert_eq!(frame.texture_rows(20).len(), 448);
    }
}

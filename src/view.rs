//! Per-view uniforms indexed by the shader's instance id: entry 0 renders the
//! left (primary) view, entry 1 the right (secondary) view.

use bytemuck::{cast_slice, Pod, Zeroable};
use glam::Mat4;

use crate::error::LayoutError;
use crate::layout::{check_layout, matrix, Field, FieldKind, GpuLayout};
use crate::rig::{ViewPose, ViewSet};
use crate::variant::LayoutVariant;

/// Number of entries in every per-view array.
pub const VIEW_SLOTS: usize = 2;

/// Layouts that replicate the active view count into every per-view entry.
pub trait SharedViewCount {
    fn view_count(&self) -> i32;
}

/// The two-entry array bound for a stereo draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerView<T: GpuLayout>(pub [T; VIEW_SLOTS]);

impl<T: GpuLayout> PerView<T> {
    pub fn from_fn(mut entry: impl FnMut(usize) -> T) -> Self {
        Self([entry(0), entry(1)])
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.0.get(index)
    }

    /// Bytes uploaded for the draw: both entries back to back.
    pub fn as_bytes(&self) -> &[u8] {
        cast_slice(&self.0[..])
    }

    pub fn byte_len(&self) -> usize {
        std::mem::size_of::<T>() * VIEW_SLOTS
    }
}

impl<T: GpuLayout + SharedViewCount> PerView<T> {
    /// Shared view count. Shaders read entry 0, so the entries must agree.
    pub fn view_count(&self) -> Result<i32, LayoutError> {
        let first = self.0[0].view_count();
        let second = self.0[1].view_count();
        if first != second {
            return Err(LayoutError::ViewCountMismatch { first, second });
        }
        Ok(first)
    }
}

/// Camera and projection of one view, with inverses.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ViewUniforms {
    pub camera_transform: [[f32; 4]; 4],
    pub camera_transform_inverse: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub projection_inverse: [[f32; 4]; 4],
}

impl GpuLayout for ViewUniforms {
    const SHADER_NAME: &'static str = "ViewUniforms";
    const FIELDS: &'static [Field] = &[
        Field::new("cameraTransform", FieldKind::Float4x4),
        Field::new("cameraTransformInverse", FieldKind::Float4x4),
        Field::new("projection", FieldKind::Float4x4),
        Field::new("projectionInverse", FieldKind::Float4x4),
    ];
    const VARIANT: LayoutVariant = LayoutVariant::View;
}

check_layout!(ViewUniforms {
    camera_transform,
    camera_transform_inverse,
    projection,
    projection_inverse,
});

impl ViewUniforms {
    pub fn new(view: &ViewPose) -> Self {
        Self {
            camera_transform: view.camera_transform.to_cols_array_2d(),
            camera_transform_inverse: view.camera_from_world().to_cols_array_2d(),
            projection: view.projection.to_cols_array_2d(),
            projection_inverse: view.projection.inverse().to_cols_array_2d(),
        }
    }

    pub fn per_view(views: &ViewSet) -> PerView<Self> {
        PerView::from_fn(|index| Self::new(&views.view(index)))
    }

    pub fn camera_transform(&self) -> Mat4 {
        matrix(&self.camera_transform)
    }

    pub fn projection(&self) -> Mat4 {
        matrix(&self.projection)
    }
}

/// Model, camera and projection transforms of one view, named by the spaces
/// they map between.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ModelViewUniforms {
    pub view_count: i32,
    _pad0: [i32; 3],
    pub world_from_model: [[f32; 4]; 4],
    pub world_from_camera: [[f32; 4]; 4],
    pub camera_from_world: [[f32; 4]; 4],
    pub camera_from_model: [[f32; 4]; 4],
    pub projection_from_camera: [[f32; 4]; 4],
    pub camera_from_projection: [[f32; 4]; 4],
}

impl GpuLayout for ModelViewUniforms {
    const SHADER_NAME: &'static str = "ModelViewUniforms";
    const FIELDS: &'static [Field] = &[
        Field::new("viewCount", FieldKind::Int),
        Field::new("worldFromModelTransform", FieldKind::Float4x4),
        Field::new("worldFromCameraTransform", FieldKind::Float4x4),
        Field::new("cameraFromWorldTransform", FieldKind::Float4x4),
        Field::new("cameraFromModelTransform", FieldKind::Float4x4),
        Field::new("projectionFromCameraTransform", FieldKind::Float4x4),
        Field::new("cameraFromProjectionTransform", FieldKind::Float4x4),
    ];
    const VARIANT: LayoutVariant = LayoutVariant::ModelView;
}

check_layout!(ModelViewUniforms {
    view_count,
    world_from_model,
    world_from_camera,
    camera_from_world,
    camera_from_model,
    projection_from_camera,
    camera_from_projection,
});

impl ModelViewUniforms {
    pub fn new(world_from_model: Mat4, view: &ViewPose, view_count: i32) -> Self {
        let camera_from_world = view.camera_from_world();
        Self {
            view_count,
            _pad0: [0; 3],
            world_from_model: world_from_model.to_cols_array_2d(),
            world_from_camera: view.camera_transform.to_cols_array_2d(),
            camera_from_world: camera_from_world.to_cols_array_2d(),
            camera_from_model: (camera_from_world * world_from_model).to_cols_array_2d(),
            projection_from_camera: view.projection.to_cols_array_2d(),
            camera_from_projection: view.projection.inverse().to_cols_array_2d(),
        }
    }

    /// Both entries carry the same view count; in mono the second entry
    /// repeats the first view.
    pub fn per_view(world_from_model: Mat4, views: &ViewSet) -> PerView<Self> {
        let count = views.count() as i32;
        PerView::from_fn(|index| Self::new(world_from_model, &views.view(index), count))
    }

    pub fn world_from_model(&self) -> Mat4 {
        matrix(&self.world_from_model)
    }

    pub fn camera_from_model(&self) -> Mat4 {
        matrix(&self.camera_from_model)
    }

    pub fn world_from_camera(&self) -> Mat4 {
        matrix(&self.world_from_camera)
    }

    pub fn camera_from_world(&self) -> Mat4 {
        matrix(&self.camera_from_world)
    }

    pub fn projection_from_camera(&self) -> Mat4 {
        matrix(&self.projection_from_camera)
    }

    pub fn camera_from_projection(&self) -> Mat4 {
        matrix(&self.camera_from_projection)
    }
}

impl SharedViewCount for ModelViewUniforms {
    fn view_count(&self) -> i32 {
        self.view_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::Rig;
    use glam::{Quat, Vec3};

    fn device() -> Mat4 {
        Mat4::from_rotation_translation(Quat::from_rotation_x(-0.2), Vec3::new(0.0, 1.5, 0.5))
    }

    #[test]
    fn view_count_is_replicated() {
        let model = Mat4::from_translation(Vec3::new(0.0, 0.0, -1.0));

        let stereo = ModelViewUniforms::per_view(model, &Rig::default_stereo().views(device()));
        assert_eq!(stereo.view_count(), Ok(2));

        let mono = ModelViewUniforms::per_view(model, &Rig::default_mono().views(device()));
        assert_eq!(mono.view_count(), Ok(1));
        assert_eq!(mono.0[0], mono.0[1]);
    }

    #[test]
    fn diverging_view_counts_are_reported() {
        let views = Rig::default_stereo().views(device());
        let mut uniforms = ModelViewUniforms::per_view(Mat4::IDENTITY, &views);
        uniforms.0[1].view_count = 1;
        assert_eq!(
            uniforms.view_count(),
            Err(LayoutError::ViewCountMismatch {
                first: 2,
                second: 1
            })
        );
    }

    #[test]
    fn derived_transforms_are_consistent() {
        let model = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::from_rotation_z(0.4),
            Vec3::new(1.0, 0.0, -3.0),
        );
        let views = Rig::default_stereo().views(device());
        let uniforms = ModelViewUniforms::per_view(model, &views);
        for entry in &uniforms.0 {
            let round_trip = entry.world_from_camera() * entry.camera_from_world();
            assert!(round_trip.abs_diff_eq(Mat4::IDENTITY, 1e-5));
            let projection = entry.projection_from_camera() * entry.camera_from_projection();
            assert!(projection.abs_diff_eq(Mat4::IDENTITY, 1e-4));
            let model_again = entry.world_from_camera() * entry.camera_from_model();
            assert!(model_again.abs_diff_eq(entry.world_from_model(), 1e-4));
        }
    }

    #[test]
    fn per_view_bytes_cover_both_entries() {
        let views = Rig::default_stereo().views(device());
        let uniforms = ViewUniforms::per_view(&views);
        assert_eq!(uniforms.as_bytes().len(), 512);
        assert_eq!(uniforms.byte_len(), 512);
        assert_eq!(uniforms.0[0].camera_transform(), views.left().camera_transform);
        assert_eq!(uniforms.0[1].projection(), views.right().projection);

        let model_view = ModelViewUniforms::per_view(Mat4::IDENTITY, &views);
        assert_eq!(model_view.as_bytes().len(), 800);
        assert_eq!(&model_view.as_bytes()[400..404], &2i32.to_ne_bytes());
    }
}

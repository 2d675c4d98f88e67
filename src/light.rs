//! Spot light and surface lighting uniforms.
//!
//! View-space light position and direction are derived from the eye cameras
//! so the fragment stage does not transform them per pixel. They go stale as
//! soon as a camera or the light moves; call
//! [`VolumeSpotLight::refresh_view_space`] after either changes.

use bytemuck::{cast_slice, Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::frame::EyeFrameUniforms;
use crate::layout::{check_layout, float3_slot, matrix, slot_vec3, Field, FieldKind, GpuLayout};
use crate::rig::ViewSet;
use crate::variant::LayoutVariant;
use crate::view::{PerView, SharedViewCount, VIEW_SLOTS};

/// Length of the cone volume drawn for a spot light, in world units.
pub const LIGHT_VOLUME_LENGTH: f32 = 10.0;

/// Host-side description of a spot light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    pub position: Vec3,
    pub direction: Vec3,
    /// Cosine of the cone half-angle.
    pub angle_cos: f32,
    #[serde(default = "default_color")]
    pub color: Vec3,
    #[serde(default = "default_intensity")]
    pub intensity: f32,
}

fn default_color() -> Vec3 {
    Vec3::ONE
}

fn default_intensity() -> f32 {
    1.0
}

impl SpotLight {
    /// World-from-model transform of the light's cone volume: a unit mesh
    /// pointing down -Y, widened by the cone and turned onto the direction.
    pub fn volume_transform(&self) -> Mat4 {
        let spread = 1.0 - self.angle_cos * self.angle_cos;
        if spread <= f32::EPSILON {
            warn!(
                "spot light at {:?} has a degenerate cone (angle cos {}); its volume is flat",
                self.position, self.angle_cos
            );
        }
        let direction = match self.direction.try_normalize() {
            Some(direction) => direction,
            None => {
                warn!("spot light at {:?} has no direction; pointing it down", self.position);
                Vec3::NEG_Y
            }
        };
        Mat4::from_scale_rotation_translation(
            Vec3::new(spread, 1.0, spread) * LIGHT_VOLUME_LENGTH,
            Quat::from_rotation_arc(Vec3::NEG_Y, direction),
            self.position,
        )
    }
}

/// Spot light as read by the volumetric light pass.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct VolumeSpotLight {
    pub world_from_model: [[f32; 4]; 4],
    pub model_from_world: [[f32; 4]; 4],
    pub position: [f32; 4],
    pub position_in_view: [[f32; 4]; VIEW_SLOTS],
    pub direction: [f32; 4],
    pub direction_in_view: [[f32; 4]; VIEW_SLOTS],
    pub angle_cos: f32,
    _pad0: [f32; 3],
    pub color: [f32; 4],
    pub intensity: f32,
    _pad1: [f32; 3],
}

impl GpuLayout for VolumeSpotLight {
    const SHADER_NAME: &'static str = "VolumeSpotLight";
    const FIELDS: &'static [Field] = &[
        Field::new("worldFromModelTransform", FieldKind::Float4x4),
        Field::new("modelFromWorldTransform", FieldKind::Float4x4),
        Field::new("position", FieldKind::Float3),
        Field::array("positionInView", FieldKind::Float3, VIEW_SLOTS),
        Field::new("direction", FieldKind::Float3),
        Field::array("directionInView", FieldKind::Float3, VIEW_SLOTS),
        Field::new("angleCos", FieldKind::Float),
        Field::new("color", FieldKind::Float3),
        Field::new("intensity", FieldKind::Float),
    ];
    const VARIANT: LayoutVariant = LayoutVariant::VolumeSpotLight;
}

check_layout!(VolumeSpotLight {
    world_from_model,
    model_from_world,
    position,
    position_in_view,
    direction,
    direction_in_view,
    angle_cos,
    color,
    intensity,
});

impl VolumeSpotLight {
    pub fn new(light: &SpotLight, views: &ViewSet) -> Self {
        let world_from_model = light.volume_transform();
        let mut uniform = Self {
            world_from_model: world_from_model.to_cols_array_2d(),
            model_from_world: world_from_model.inverse().to_cols_array_2d(),
            position: float3_slot(light.position),
            position_in_view: [[0.0; 4]; VIEW_SLOTS],
            direction: float3_slot(light.direction),
            direction_in_view: [[0.0; 4]; VIEW_SLOTS],
            angle_cos: light.angle_cos,
            _pad0: [0.0; 3],
            color: float3_slot(light.color),
            intensity: light.intensity,
            _pad1: [0.0; 3],
        };
        uniform.refresh_view_space(views);
        uniform
    }

    /// Recomputes the per-view position and direction from the current eye
    /// cameras. In mono both slots hold the single view.
    pub fn refresh_view_space(&mut self, views: &ViewSet) {
        let position = self.position();
        let direction = self.direction();
        for index in 0..VIEW_SLOTS {
            let camera_from_world = views.view(index).camera_from_world();
            self.position_in_view[index] =
                float3_slot(camera_from_world.transform_point3(position));
            self.direction_in_view[index] =
                float3_slot(camera_from_world.transform_vector3(direction));
        }
    }

    pub fn world_from_model(&self) -> Mat4 {
        matrix(&self.world_from_model)
    }

    pub fn model_from_world(&self) -> Mat4 {
        matrix(&self.model_from_world)
    }

    pub fn position(&self) -> Vec3 {
        slot_vec3(self.position)
    }

    pub fn direction(&self) -> Vec3 {
        slot_vec3(self.direction)
    }

    /// View-space position for an eye (0 = left, 1 = right).
    pub fn position_in_view(&self, index: usize) -> Vec3 {
        slot_vec3(self.position_in_view[view_slot(index)])
    }

    pub fn direction_in_view(&self, index: usize) -> Vec3 {
        slot_vec3(self.direction_in_view[view_slot(index)])
    }
}

fn view_slot(index: usize) -> usize {
    index.min(VIEW_SLOTS - 1)
}

/// Light array bytes for the fragment stage.
pub fn light_bytes(lights: &[VolumeSpotLight]) -> &[u8] {
    cast_slice(lights)
}

/// Light count passed alongside the light array.
pub fn light_count(lights: &[VolumeSpotLight]) -> i32 {
    i32::try_from(lights.len()).unwrap_or(i32::MAX)
}

/// Camera transforms the surface lighting pass uses to rebuild world
/// positions from depth.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SurfaceLightUniforms {
    pub view_count: i32,
    _pad0: [i32; 3],
    pub camera_from_projection: [[f32; 4]; 4],
    pub world_from_camera: [[f32; 4]; 4],
    pub camera_from_world: [[f32; 4]; 4],
}

impl GpuLayout for SurfaceLightUniforms {
    const SHADER_NAME: &'static str = "SurfaceLightUniforms";
    const FIELDS: &'static [Field] = &[
        Field::new("viewCount", FieldKind::Int),
        Field::new("cameraFromProjectionTransform", FieldKind::Float4x4),
        Field::new("worldFromCameraTransform", FieldKind::Float4x4),
        Field::new("cameraFromWorldTransform", FieldKind::Float4x4),
    ];
    const VARIANT: LayoutVariant = LayoutVariant::SurfaceLight;
}

check_layout!(SurfaceLightUniforms {
    view_count,
    camera_from_projection,
    world_from_camera,
    camera_from_world,
});

impl SurfaceLightUniforms {
    pub fn new(camera_from_projection: Mat4, world_from_camera: Mat4, view_count: i32) -> Self {
        Self {
            view_count,
            _pad0: [0; 3],
            camera_from_projection: camera_from_projection.to_cols_array_2d(),
            world_from_camera: world_from_camera.to_cols_array_2d(),
            camera_from_world: world_from_camera.inverse().to_cols_array_2d(),
        }
    }

    /// One entry per eye of the frame, sharing `view_count`.
    pub fn per_view(frame: &EyeFrameUniforms, view_count: i32) -> PerView<Self> {
        PerView::from_fn(|index| {
            Self::new(
                frame.projection_inverse(index),
                frame.camera_transform(index),
                view_count,
            )
        })
    }

    pub fn world_from_camera(&self) -> Mat4 {
        matrix(&self.world_from_camera)
    }

    pub fn camera_from_world(&self) -> Mat4 {
        matrix(&self.camera_from_world)
    }
}

impl SharedViewCount for SurfaceLightUniforms {
    fn view_count(&self) -> i32 {
        self.view_count
    }
}

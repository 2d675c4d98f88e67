//! Per-eye camera poses derived from a tracked device pose.

use glam::{Mat4, Vec3, Vec4};
use log::debug;
use serde::{Deserialize, Serialize};

/// World-from-camera transform and projection of one rendered view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewPose {
    pub camera_transform: Mat4,
    pub projection: Mat4,
}

impl ViewPose {
    pub fn new(camera_transform: Mat4, projection: Mat4) -> Self {
        Self {
            camera_transform,
            projection,
        }
    }

    pub fn camera_from_world(&self) -> Mat4 {
        self.camera_transform.inverse()
    }
}

/// The views rendered in one frame: a primary (left) view and, for stereo,
/// a secondary (right) view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewSet {
    pub primary: ViewPose,
    pub secondary: Option<ViewPose>,
}

impl ViewSet {
    pub fn mono(view: ViewPose) -> Self {
        Self {
            primary: view,
            secondary: None,
        }
    }

    pub fn stereo(left: ViewPose, right: ViewPose) -> Self {
        Self {
            primary: left,
            secondary: Some(right),
        }
    }

    /// Number of active views, 1 or 2.
    pub fn count(&self) -> usize {
        if self.secondary.is_some() {
            2
        } else {
            1
        }
    }

    /// View for a stereo slot. Slot 1 falls back to the primary view in mono.
    pub fn view(&self, index: usize) -> ViewPose {
        match index {
            0 => self.primary,
            _ => self.secondary.unwrap_or(self.primary),
        }
    }

    pub fn left(&self) -> ViewPose {
        self.view(0)
    }

    pub fn right(&self) -> ViewPose {
        self.view(1)
    }
}

/// Offsets of the left and right eye from the tracked device origin, in the
/// device's right/up/forward axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeShift {
    pub left: Vec3,
    pub right: Vec3,
}

impl EyeShift {
    pub const MONO: Self = Self::new(0.0, 0.0, 0.0);
    /// Measured offset of the headset eye cameras from the device anchor.
    pub const STEREO: Self = Self::new(0.064, -0.0261, -0.0212);

    pub const fn new(ipd: f32, shift_y: f32, shift_z: f32) -> Self {
        Self {
            left: Vec3::new(-ipd / 2.0, shift_y, shift_z),
            right: Vec3::new(ipd / 2.0, shift_y, shift_z),
        }
    }
}

/// Projection used when rendering a single view.
pub fn default_mono_projection() -> Mat4 {
    Mat4::from_cols_array_2d(&[
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.777_777_8, 0.0, 0.0],
        [0.0, 0.0, 0.0, -1.0],
        [0.0, 0.0, 0.1, 0.0],
    ])
}

/// Asymmetric left/right projections of the headset displays.
pub fn default_stereo_projections() -> [Mat4; 2] {
    [
        Mat4::from_cols_array_2d(&[
            [0.709_561_17, 2.704_876_9e-5, 0.0, 0.000_253_954_12],
            [1.670_781_8e-6, 0.884_401_5, 0.0, 6.786_168e-6],
            [-0.267_310_65, -0.088_083_79, 0.0, -1.000_093_6],
            [0.0, 0.0, 0.096_919_28, 0.0],
        ]),
        Mat4::from_cols_array_2d(&[
            [0.709_659_76, -1.733_384_9e-5, 0.0, -0.000_252_923_52],
            [2.067_866_5e-6, 0.884_519_3, 0.0, -8.016_048e-6],
            [0.267_740_7, -0.086_908_735, 0.0, -1.000_091_8],
            [0.0, 0.0, 0.096_932_31, 0.0],
        ]),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Projections {
    Mono(Mat4),
    Stereo([Mat4; 2]),
}

/// Eye placement and projections of the display the frame is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rig {
    pub shift: EyeShift,
    pub projections: Projections,
}

impl Rig {
    pub fn mono(projection: Mat4) -> Self {
        Self {
            shift: EyeShift::MONO,
            projections: Projections::Mono(projection),
        }
    }

    pub fn stereo(shift: EyeShift, projections: [Mat4; 2]) -> Self {
        Self {
            shift,
            projections: Projections::Stereo(projections),
        }
    }

    pub fn default_mono() -> Self {
        Self::mono(default_mono_projection())
    }

    pub fn default_stereo() -> Self {
        Self::stereo(EyeShift::STEREO, default_stereo_projections())
    }

    pub fn view_count(&self) -> usize {
        match self.projections {
            Projections::Mono(_) => 1,
            Projections::Stereo(_) => 2,
        }
    }

    /// Places the eye cameras relative to the tracked device transform.
    pub fn views(&self, device_transform: Mat4) -> ViewSet {
        match self.projections {
            Projections::Mono(projection) => {
                ViewSet::mono(ViewPose::new(device_transform, projection))
            }
            Projections::Stereo([left, right]) => {
                let left_camera = shift_camera(device_transform, self.shift.left);
                let right_camera = shift_camera(device_transform, self.shift.right);
                debug!(
                    "eye cameras at {:?} / {:?}",
                    left_camera.w_axis.truncate(),
                    right_camera.w_axis.truncate()
                );
                ViewSet::stereo(
                    ViewPose::new(left_camera, left),
                    ViewPose::new(right_camera, right),
                )
            }
        }
    }
}

fn shift_camera(device_transform: Mat4, shift: Vec3) -> Mat4 {
    let axis = |column: Vec4| column.truncate().normalize_or_zero().extend(0.0);
    let right = axis(device_transform.x_axis);
    let up = axis(device_transform.y_axis);
    let forward = axis(device_transform.z_axis);
    let mut camera = device_transform;
    camera.w_axis += right * shift.x + up * shift.y + forward * shift.z;
    camera
}

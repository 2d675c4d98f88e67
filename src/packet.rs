use bytemuck::bytes_of;
use glam::Mat4;
use log::debug;

use crate::config::FrameDescription;
use crate::error::LayoutError;
use crate::fragment::FragmentUniforms;
use crate::gpu::buffer_descriptor;
use crate::frame::{EyeFrameUniforms, FrameUniforms, ProjectionUniforms};
use crate::light::{light_bytes, SurfaceLightUniforms, VolumeSpotLight};
use crate::rig::ViewSet;
use crate::variant::LayoutVariant;
use crate::view::{ModelViewUniforms, PerView, ViewUniforms};

/// Every uniform block the host writes for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePacket {
    pub views: ViewSet,
    pub frame: FrameUniforms,
    pub eye_frame: EyeFrameUniforms,
    pub projection: ProjectionUniforms,
    pub view: PerView<ViewUniforms>,
    pub model_view: PerView<ModelViewUniforms>,
    pub fragment: FragmentUniforms,
    pub lights: Vec<VolumeSpotLight>,
    pub surface_light: PerView<SurfaceLightUniforms>,
}

impl FramePacket {
    /// Populates all blocks from the frame inputs. The centre camera is the
    /// tracked device transform itself.
    pub fn build(description: &FrameDescription) -> Result<Self, LayoutError> {
        let device = description.device.matrix();
        let views = description.rig.views(device);
        let view_count = views.count() as i32;

        let eye_frame = EyeFrameUniforms::from_views(&views);
        let model_view = ModelViewUniforms::per_view(description.model.matrix(), &views);
        let surface_light = SurfaceLightUniforms::per_view(&eye_frame, view_count);
        model_view.view_count()?;
        surface_light.view_count()?;

        let lights = description
            .lights
            .iter()
            .map(|light| VolumeSpotLight::new(light, &views))
            .collect::<Vec<_>>();
        debug!("packed frame with {view_count} view(s) and {} light(s)", lights.len());

        Ok(Self {
            views,
            frame: FrameUniforms::new(device, &views),
            eye_frame,
            projection: ProjectionUniforms::new(device, &views),
            view: ViewUniforms::per_view(&views),
            model_view,
            fragment: FragmentUniforms::new(description.width, description.height),
            lights,
            surface_light,
        })
    }

    /// Recomputes everything derived from the camera after the device moves.
    pub fn update_device(&mut self, description: &FrameDescription, device: Mat4) {
        let views = description.rig.views(device);
        self.views = views;
        self.frame = FrameUniforms::new(device, &views);
        self.eye_frame = EyeFrameUniforms::from_views(&views);
        self.projection = ProjectionUniforms::new(device, &views);
        self.view = ViewUniforms::per_view(&views);
        self.model_view = ModelViewUniforms::per_view(description.model.matrix(), &views);
        self.surface_light = SurfaceLightUniforms::per_view(&self.eye_frame, views.count() as i32);
        for light in &mut self.lights {
            light.refresh_view_space(&views);
        }
    }

    /// Upload-ready bytes of every block, tagged with its layout.
    pub fn blocks(&self) -> Vec<(LayoutVariant, &[u8])> {
        vec![
            (LayoutVariant::Frame, bytes_of(&self.frame)),
            (LayoutVariant::EyeFrame, bytes_of(&self.eye_frame)),
            (LayoutVariant::ProjectionFrame, bytes_of(&self.projection)),
            (LayoutVariant::View, self.view.as_bytes()),
            (LayoutVariant::ModelView, self.model_view.as_bytes()),
            (LayoutVariant::Fragment, bytes_of(&self.fragment)),
            (LayoutVariant::VolumeSpotLight, light_bytes(&self.lights)),
            (LayoutVariant::SurfaceLight, self.surface_light.as_bytes()),
        ]
    }

    /// One buffer descriptor per block, labelled with the layout key and
    /// sized for the blocks returned by [`FramePacket::blocks`]. An empty light
    /// array still gets a one-light slot.
    pub fn buffer_descriptors(&self) -> Vec<wgpu::BufferDescriptor<'static>> {
        self.blocks()
            .into_iter()
            .map(|(variant, bytes)| {
                buffer_descriptor(variant, variant.key(), bytes.len() / variant.size())
            })
            .collect()
    }
}

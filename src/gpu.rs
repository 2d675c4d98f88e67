//! `wgpu` descriptors sized from the layout variants.

use crate::variant::{Binding, LayoutVariant};
use crate::view::VIEW_SLOTS;

/// Number of records a binding of `variant` spans. `count` is the length of
/// an array binding and is ignored for the other kinds.
fn record_count(variant: LayoutVariant, count: usize) -> usize {
    match variant.binding() {
        Binding::PerView => VIEW_SLOTS,
        Binding::Array | Binding::VertexBuffer => count.max(1),
        Binding::Uniform => 1,
    }
}

/// Smallest buffer range a binding of `variant` holding `count` records may
/// be given.
pub fn min_binding_size(variant: LayoutVariant, count: usize) -> Option<wgpu::BufferSize> {
    wgpu::BufferSize::new((variant.size() * record_count(variant, count)) as u64)
}

/// Bind group layout entry for a uniform or light layout. Vertex layouts are
/// bound as vertex buffers and have no entry.
pub fn layout_entry(
    variant: LayoutVariant,
    binding: u32,
    visibility: wgpu::ShaderStages,
    count: usize,
) -> Option<wgpu::BindGroupLayoutEntry> {
    let ty = match variant.binding() {
        Binding::Uniform | Binding::PerView => wgpu::BufferBindingType::Uniform,
        Binding::Array => wgpu::BufferBindingType::Storage { read_only: true },
        Binding::VertexBuffer => return None,
    };
    Some(wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: min_binding_size(variant, count),
        },
        count: None,
    })
}

/// Buffer usages a layout's buffer needs.
pub fn buffer_usage(variant: LayoutVariant) -> wgpu::BufferUsages {
    match variant.binding() {
        Binding::Uniform | Binding::PerView => {
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST
        }
        Binding::Array => wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        Binding::VertexBuffer => wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    }
}

/// Descriptor of a buffer slot large enough for `count` records of `variant`.
pub fn buffer_descriptor(
    variant: LayoutVariant,
    label: &str,
    count: usize,
) -> wgpu::BufferDescriptor<'_> {
    wgpu::BufferDescriptor {
        label: Some(label),
        size: (variant.size() * record_count(variant, count)) as wgpu::BufferAddress,
        usage: buffer_usage(variant),
        mapped_at_creation: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_view_bindings_cover_both_entries() {
        let size = min_binding_size(LayoutVariant::ModelView, 1).map(|size| size.get());
        assert_eq!(size, Some(800));
        let size = min_binding_size(LayoutVariant::Frame, 3).map(|size| size.get());
        assert_eq!(size, Some(448));
    }

    #[test]
    fn lights_bind_as_read_only_storage() {
        let entry = layout_entry(
            LayoutVariant::VolumeSpotLight,
            1,
            wgpu::ShaderStages::FRAGMENT,
            4,
        )
        .expect("lights have an entry");
        match entry.ty {
            wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                min_binding_size,
                ..
            } => {
                assert!(read_only);
                assert_eq!(min_binding_size.map(|size| size.get()), Some(4 * 272));
            }
            other => panic!("unexpected binding {other:?}"),
        }
    }

    #[test]
    fn empty_light_array_still_binds_one_record() {
        let size = min_binding_size(LayoutVariant::VolumeSpotLight, 0).map(|size| size.get());
        assert_eq!(size, Some(272));
    }

    #[test]
    fn vertex_layouts_have_no_bind_group_entry() {
        assert!(layout_entry(LayoutVariant::Vertex, 0, wgpu::ShaderStages::VERTEX, 3).is_none());
        assert!(buffer_usage(LayoutVariant::MaskedVertex).contains(wgpu::BufferUsages::VERTEX));
    }

    #[test]
    fn descriptors_size_the_slot_for_their_records() {
        let lights = buffer_descriptor(LayoutVariant::VolumeSpotLight, "lights", 5);
        assert_eq!(lights.size, 5 * 272);
        assert_eq!(lights.label, Some("lights"));
        assert!(lights.usage.contains(wgpu::BufferUsages::STORAGE));
        assert!(!lights.mapped_at_creation);

        let surface = buffer_descriptor(LayoutVariant::SurfaceLight, "surface", 0);
        assert_eq!(surface.size, 416);
        assert!(surface.usage.contains(wgpu::BufferUsages::UNIFORM));

        let vertices = buffer_descriptor(LayoutVariant::MaskedVertex, "mask", 100);
        assert_eq!(vertices.size, 3200);
    }
}

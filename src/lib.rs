//! Memory-layout contracts for the uniform, vertex and light blocks a stereo
//! AR/VR renderer shares between the host and its shaders.
//!
//! Every block is a `#[repr(C)]` plain-old-data struct whose byte size and
//! field offsets are checked at compile time against a field table. The same
//! table generates the shader-side declaration, so the host and the GPU
//! cannot drift apart silently.

pub mod config;
pub mod error;
pub mod fragment;
pub mod frame;
pub mod gpu;
pub mod layout;
pub mod light;
pub mod packet;
pub mod rig;
pub mod variant;
pub mod vertex;
pub mod view;

pub use config::{FrameDescription, Pose};
pub use error::LayoutError;
pub use fragment::FragmentUniforms;
pub use frame::{EyeFrameUniforms, FrameUniforms, ProjectionUniforms};
pub use layout::{Field, FieldKind, GpuLayout};
pub use light::{SpotLight, SurfaceLightUniforms, VolumeSpotLight};
pub use packet::FramePacket;
pub use rig::{EyeShift, Projections, Rig, ViewPose, ViewSet};
pub use variant::{shader_header, Binding, LayoutVariant};
pub use vertex::{MaskedVertex, Vertex, VertexAttributes, VertexBuffer, VertexLayout};
pub use view::{ModelViewUniforms, PerView, SharedViewCount, ViewUniforms};

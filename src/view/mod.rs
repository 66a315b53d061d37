// VIEW: Rendering and graphics
pub mod render;
pub mod gpu_init;
pub mod texture;

pub use render::{CameraResources, RenderState};
pub use gpu_init::GpuContext;

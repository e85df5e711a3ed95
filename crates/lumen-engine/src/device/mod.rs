//! wgpu device and window surface.
//!
//! Creates the instance/adapter/device/queue, configures the swapchain, and
//! hands out frames (surface view + encoder) for the engine to draw into.

mod gpu;
mod init;
mod surface;

pub use gpu::{Gpu, GpuFrame};
pub use init::GpuInit;
pub use surface::SurfaceErrorAction;

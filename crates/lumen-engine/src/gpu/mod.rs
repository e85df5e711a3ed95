//! GPU context abstraction.
//!
//! `Graphics` is written against [`GpuBackend`], an immediate bind-then-draw
//! surface. [`RecordingBackend`] logs calls for headless runs and tests;
//! [`WgpuBackend`] drives a real device.

mod backend;
mod recording;
mod types;
mod wgpu_backend;

pub use backend::GpuBackend;
pub use recording::{CommandLog, GpuCommand, RecordingBackend};
pub use types::{
    AttributeDecl, AttributeRole, ImageId, ProgramId, ShaderSource, TargetId, UniformDecl,
    UniformKind, UniformValue,
};
pub use wgpu_backend::WgpuBackend;

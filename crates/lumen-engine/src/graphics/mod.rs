//! Shader programs and the batching draw engine.

pub mod builtin;
mod config;
mod graphics;
mod resolution;
mod shader;
mod target;

pub(crate) use config::color_array;
pub use config::GraphicsConfig;
pub use graphics::{DrawParams, Graphics};
pub use resolution::ResolutionStyle;
pub use shader::{Attribute, Shader, ShaderId, Uniform};
pub use target::RenderTarget;

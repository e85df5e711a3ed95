//! winit event loop with one window and its GPU surface.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};

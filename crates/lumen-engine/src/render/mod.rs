//! Camera and scene renderers.
//!
//! Renderers own a camera and an optional offscreen target. Each frame the
//! scene asks every visible renderer to bind its state on the shared
//! [`Graphics`](crate::graphics::Graphics) and draw some subset of its
//! entities. Geometry stays in world pixels; the camera matrix takes it to NDC.

mod camera;
mod ctx;
mod renderer;

pub use camera::Camera;
pub use ctx::DrawCtx;
pub use renderer::{EverythingRenderer, GroupRenderer, RenderPass, Renderer};

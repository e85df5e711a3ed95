//! Geometry value types shared by the renderer, scene and collision code.
//!
//! Canonical space:
//! - pixels
//! - origin top-left
//! - +X right, +Y down
//!
//! The camera and `Mat3::orthographic` take this space to normalized device
//! coordinates; shaders never see anything else.

mod mat3;
mod rect;
mod vec2;
mod viewport;

pub use mat3::Mat3;
pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;

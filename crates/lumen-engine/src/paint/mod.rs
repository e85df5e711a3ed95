//! Color and blending.
//!
//! Shaders multiply texture samples by the per-vertex color; the color is
//! uploaded as straight alpha and the built-in shaders premultiply in the
//! fragment stage to match `BlendMode::NORMAL`.

mod blend;
mod color;

pub use blend::{BlendFactor, BlendMode};
pub use color::Color;

//! Shaders every `Graphics` instance compiles at startup.

use crate::gpu::{AttributeRole, ShaderSource, UniformKind};

/// Name of the projection uniform the built-ins and renderers share.
pub const MATRIX_UNIFORM: &str = "matrix";
pub const TEXTURE_UNIFORM: &str = "u_texture";

fn sampled(name: &str, wgsl: &str) -> ShaderSource {
    ShaderSource::new(name, wgsl, wgsl)
        .uniform(MATRIX_UNIFORM, UniformKind::Mat3)
        .uniform(TEXTURE_UNIFORM, UniformKind::Sampler2D)
        .attribute("a_position", AttributeRole::Position)
        .attribute("a_texcoord", AttributeRole::Texcoord)
        .attribute("a_color", AttributeRole::Color)
}

/// Textured quads tinted by vertex color.
pub fn texture() -> ShaderSource {
    sampled("texture", include_str!("shaders/texture.wgsl"))
}

/// Texture alpha filled with the vertex color.
pub fn solid() -> ShaderSource {
    sampled("solid", include_str!("shaders/solid.wgsl"))
}

/// Untextured geometry.
pub fn primitive() -> ShaderSource {
    let wgsl = include_str!("shaders/primitive.wgsl");
    ShaderSource::new("primitive", wgsl, wgsl)
        .uniform(MATRIX_UNIFORM, UniformKind::Mat3)
        .attribute("a_position", AttributeRole::Position)
        .attribute("a_color", AttributeRole::Color)
}

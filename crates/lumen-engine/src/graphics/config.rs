use serde::{Deserialize, Serialize};

use crate::error::AssertMode;
use crate::paint::Color;

use super::ResolutionStyle;

/// Settings for the batching engine and its internal buffer.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GraphicsConfig {
    pub buffer_width: u32,
    pub buffer_height: u32,
    pub resolution: ResolutionStyle,
    /// Cleared into the buffer at the start of each frame.
    #[serde(with = "color_array")]
    pub clear_color: Color,
    /// Fills the screen around the scaled buffer.
    #[serde(with = "color_array")]
    pub border_color: Color,
    pub assert_mode: AssertMode,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            buffer_width: 320,
            buffer_height: 180,
            resolution: ResolutionStyle::Contain,
            clear_color: Color::from_hex(0x1d2b53),
            border_color: Color::black(),
            assert_mode: AssertMode::Normal,
        }
    }
}

impl GraphicsConfig {
    pub fn with_buffer(mut self, width: u32, height: u32) -> Self {
        self.buffer_width = width;
        self.buffer_height = height;
        self
    }

    pub fn with_resolution(mut self, style: ResolutionStyle) -> Self {
        self.resolution = style;
        self
    }

    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_border_color(mut self, color: Color) -> Self {
        self.border_color = color;
        self
    }

    pub fn with_assert_mode(mut self, mode: AssertMode) -> Self {
        self.assert_mode = mode;
        self
    }
}

/// Colors are stored as `[r, g, b, a]` unit floats.
pub(crate) mod color_array {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::paint::Color;

    pub fn serialize<S: Serializer>(color: &Color, s: S) -> Result<S::Ok, S::Error> {
        color.to_array().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Color, D::Error> {
        let [r, g, b, a] = <[f32; 4]>::deserialize(d)?;
        Ok(Color::new(r, g, b, a))
    }
}

use serde::{Deserialize, Serialize};

use crate::coords::{Rect, Viewport};

/// How the internal buffer is scaled onto the screen.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStyle {
    /// Unscaled, centered.
    None,
    /// Stretched to fill the screen on both axes.
    Exact,
    /// Uniform scale to fit, letterboxed.
    #[default]
    Contain,
    /// `Contain` floored to a whole scale (at least 1).
    ContainInteger,
    /// Uniform scale to cover, cropped.
    Fill,
    /// `Fill` ceiled to a whole scale (at least 1).
    FillInteger,
}

impl ResolutionStyle {
    /// Per-axis scale for drawing `buffer` onto `screen`.
    pub fn scale(self, buffer: Viewport, screen: Viewport) -> (f32, f32) {
        let sx = screen.width / buffer.width.max(1.0);
        let sy = screen.height / buffer.height.max(1.0);
        match self {
            ResolutionStyle::None => (1.0, 1.0),
            ResolutionStyle::Exact => (sx, sy),
            ResolutionStyle::Contain => {
                let s = sx.min(sy);
                (s, s)
            }
            ResolutionStyle::ContainInteger => {
                let s = sx.min(sy).floor().max(1.0);
                (s, s)
            }
            ResolutionStyle::Fill => {
                let s = sx.max(sy);
                (s, s)
            }
            ResolutionStyle::FillInteger => {
                let s = sx.max(sy).ceil().max(1.0);
                (s, s)
            }
        }
    }

    /// Destination rectangle of the buffer on the screen, centered.
    pub fn output_bounds(self, buffer: Viewport, screen: Viewport) -> Rect {
        let (sx, sy) = self.scale(buffer, screen);
        let width = buffer.width * sx;
        let height = buffer.height * sy;
        Rect::new((screen.width - width) / 2.0, (screen.height - height) / 2.0, width, height)
    }
}

use crate::coords::Rect;

use super::{ColliderType, Shape};

/// Axis-aligned box, offset from its owner's scene position.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Hitbox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Hitbox {
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }

    /// Box of the given size with its origin in the middle.
    pub fn centered(width: f32, height: f32) -> Self {
        Self::new(-width / 2.0, -height / 2.0, width, height)
    }

    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.width, self.height)
    }
}

impl Shape for Hitbox {
    fn kind(&self) -> ColliderType {
        ColliderType::HITBOX
    }

    fn local_bounds(&self) -> Rect {
        self.rect()
    }
}

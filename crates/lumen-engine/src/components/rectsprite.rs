use crate::coords::{Rect, Vec2};
use crate::paint::Color;
use crate::render::DrawCtx;
use crate::scene::{Component, ComponentState};

/// Solid rectangle; `origin` is subtracted from the scene position.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rectsprite {
    pub size: Vec2,
    pub color: Color,
    pub origin: Vec2,
}

impl Rectsprite {
    pub fn new(width: f32, height: f32, color: Color) -> Self {
        Self { size: Vec2::new(width, height), color, origin: Vec2::zero() }
    }

    pub fn centered(mut self) -> Self {
        self.origin = self.size / 2.0;
        self
    }
}

impl Component for Rectsprite {
    fn render(&mut self, _state: &ComponentState, ctx: &mut DrawCtx<'_>) {
        let at = ctx.position - self.origin;
        ctx.gfx.rect(Rect::new(at.x, at.y, self.size.x, self.size.y), self.color);
    }
}

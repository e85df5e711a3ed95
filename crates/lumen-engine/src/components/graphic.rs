use crate::assets::Texture;
use crate::graphics::DrawParams;
use crate::render::DrawCtx;
use crate::scene::{Component, ComponentState};

/// Draws one texture at the component's scene position.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Graphic {
    pub texture: Texture,
    pub params: DrawParams,
}

impl Graphic {
    pub fn new(texture: Texture) -> Self {
        Self { texture, params: DrawParams::default() }
    }

    pub fn with_params(mut self, params: DrawParams) -> Self {
        self.params = params;
        self
    }

    /// Origin at the middle of the texture's logical size.
    pub fn centered(mut self) -> Self {
        self.params.origin = crate::coords::Vec2::new(self.texture.width() / 2.0, self.texture.height() / 2.0);
        self
    }
}

impl Component for Graphic {
    fn render(&mut self, _state: &ComponentState, ctx: &mut DrawCtx<'_>) {
        ctx.gfx.texture(&self.texture, ctx.position, self.params);
    }
}

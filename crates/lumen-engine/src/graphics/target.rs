use crate::assets::Texture;
use crate::coords::Viewport;
use crate::gpu::TargetId;

/// Offscreen framebuffer plus the texture it renders into.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RenderTarget {
    pub id: TargetId,
    pub texture: Texture,
    pub width: u32,
    pub height: u32,
}

impl RenderTarget {
    pub fn viewport(&self) -> Viewport {
        Viewport::from_pixels(self.width, self.height)
    }
}

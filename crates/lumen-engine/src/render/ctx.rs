use crate::coords::{Rect, Vec2};
use crate::graphics::Graphics;

use super::Camera;

/// Context handed to entity and component render hooks.
pub struct DrawCtx<'a> {
    pub gfx: &'a mut Graphics,
    /// Camera of the renderer driving this pass, if it has one.
    pub camera: Option<&'a Camera>,
    /// Scene position of the thing being drawn (entity position plus local offset).
    pub position: Vec2,
}

impl DrawCtx<'_> {
    /// World-space area the camera can see, for culling.
    #[inline]
    pub fn visible_bounds(&self) -> Option<Rect> {
        self.camera.map(Camera::extents)
    }
}

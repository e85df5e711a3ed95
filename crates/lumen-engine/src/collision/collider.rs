use std::fmt;

use crate::any::AsAny;
use crate::coords::{Rect, Vec2};
use crate::graphics::Graphics;
use crate::paint::Color;

use super::{Hitbox, Hitgrid};

/// Tag naming a concrete shape kind. Overlap tests are registered per pair of tags.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ColliderType(pub &'static str);

impl ColliderType {
    pub const HITBOX: ColliderType = ColliderType("hitbox");
    pub const HITGRID: ColliderType = ColliderType("hitgrid");

    #[inline]
    pub fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ColliderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Geometry of a collider, in coordinates local to its owner's scene position.
pub trait Shape: AsAny {
    fn kind(&self) -> ColliderType;

    /// Bounding rectangle relative to the collider's origin.
    fn local_bounds(&self) -> Rect;

    /// Draws an outline of the shape. `origin` is the collider's scene position.
    fn debug_draw(&self, gfx: &mut Graphics, origin: Vec2, color: Color) {
        let b = self.local_bounds();
        gfx.hollow_rect(Rect::new(origin.x + b.x, origin.y + b.y, b.width, b.height), 1.0, color);
    }
}

/// A shape plus the tags the scene indexes it under.
///
/// Tag edits on a collider that is already tracked by a scene must go through
/// `EntityMut::tag_collider` so the scene's buckets stay in sync.
pub struct Collider {
    tags: Vec<String>,
    shape: Box<dyn Shape>,
}

impl Collider {
    pub fn new(shape: impl Shape) -> Self {
        Self { tags: Vec::new(), shape: Box::new(shape) }
    }

    pub fn hitbox(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(Hitbox::new(x, y, width, height))
    }

    pub fn hitgrid(tile_width: f32, tile_height: f32) -> Self {
        Self::new(Hitgrid::new(tile_width, tile_height))
    }

    /// Builder form of [`Collider::tag`].
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tag(tag);
        self
    }

    /// Adds `tag`. Returns `false` if it was already present.
    pub fn tag(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if self.has_tag(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    /// Removes `tag`. Returns `false` if it was not present.
    pub fn untag(&mut self, tag: &str) -> bool {
        match self.tags.iter().position(|t| t == tag) {
            Some(i) => {
                self.tags.remove(i);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    #[inline]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    #[inline]
    pub fn kind(&self) -> ColliderType {
        self.shape.kind()
    }

    #[inline]
    pub fn shape(&self) -> &dyn Shape {
        self.shape.as_ref()
    }

    #[inline]
    pub fn shape_mut(&mut self) -> &mut dyn Shape {
        self.shape.as_mut()
    }

    /// Scene-space bounds when the collider's origin sits at `at`.
    pub fn bounds_at(&self, at: Vec2) -> Rect {
        let b = self.shape.local_bounds();
        Rect::new(b.x + at.x, b.y + at.y, b.width, b.height)
    }

    pub fn as_hitbox(&self) -> Option<&Hitbox> {
        self.shape().as_any().downcast_ref::<Hitbox>()
    }

    pub fn as_hitbox_mut(&mut self) -> Option<&mut Hitbox> {
        self.shape_mut().as_any_mut().downcast_mut::<Hitbox>()
    }

    pub fn as_hitgrid(&self) -> Option<&Hitgrid> {
        self.shape().as_any().downcast_ref::<Hitgrid>()
    }

    pub fn as_hitgrid_mut(&mut self) -> Option<&mut Hitgrid> {
        self.shape_mut().as_any_mut().downcast_mut::<Hitgrid>()
    }
}

impl fmt::Debug for Collider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collider")
            .field("kind", &self.kind())
            .field("tags", &self.tags)
            .field("bounds", &self.shape.local_bounds())
            .finish()
    }
}

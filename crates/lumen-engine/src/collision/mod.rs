//! Collision shapes and the pairwise overlap dispatch table.
//!
//! A [`Collider`] pairs a shape with the string tags the scene buckets it
//! under. Shapes are tested against each other through an [`OverlapRegistry`]
//! keyed by the pair of [`ColliderType`] tags, so adding a new shape means
//! registering its tests rather than touching existing ones.

mod collider;
mod hitbox;
mod hitgrid;
mod overlap;

pub use collider::{Collider, ColliderType, Shape};
pub use hitbox::Hitbox;
pub use hitgrid::Hitgrid;
pub use overlap::{OverlapRegistry, OverlapTest};

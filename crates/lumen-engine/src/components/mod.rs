//! Stock components: movement with pixel-exact collision, and the usual
//! drawables (texture, filled rect, animated sprite, tilemap).

mod graphic;
mod physics;
mod rectsprite;
mod sprite;
mod tilemap;

pub use graphic::Graphic;
pub use physics::Physics;
pub use rectsprite::Rectsprite;
pub use sprite::{Animation, Sprite};
pub use tilemap::Tilemap;

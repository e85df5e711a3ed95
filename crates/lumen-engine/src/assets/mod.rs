//! Textures, atlases and the resolved asset maps.

mod atlas;
pub mod readers;
mod store;
mod texture;

pub use atlas::{Atlas, AtlasReader, FrameTag};
pub use store::Assets;
pub use texture::{GpuImage, Texture};

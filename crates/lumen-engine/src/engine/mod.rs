//! Frame loop, game hooks and boot configuration.

mod config;
mod engine;
mod game;

pub use config::EngineConfig;
pub use engine::Engine;
pub use game::{Game, GameCtx};

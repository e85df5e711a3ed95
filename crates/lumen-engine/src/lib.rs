//! Lumen: a small 2D game engine.
//!
//! Scenes hold entities, entities hold components, and a batching renderer
//! draws them through an internal low-resolution buffer that is scaled onto
//! the window. Collision goes through typed colliders and a registry of
//! pairwise overlap tests.
//!
//! Layers, bottom up:
//! - `coords`, `paint`: value types
//! - `gpu`: the backend trait the renderer talks to (wgpu or recording)
//! - `graphics`: shaders, vertex batching, render targets
//! - `assets`: textures and atlases
//! - `collision`, `scene`, `render`, `components`: the game-facing model
//! - `engine`, `window`, `device`, `input`, `time`: the frame loop

pub mod any;
pub mod error;

pub mod coords;
pub mod paint;

pub mod gpu;
pub mod graphics;
pub mod assets;

pub mod collision;
pub mod scene;
pub mod render;
pub mod components;

pub mod engine;
pub mod core;
pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod logging;

pub use engine::{Engine, EngineConfig, Game, GameCtx};
pub use error::{AssertMode, EngineError, Result};

//! Keyboard and mouse state.
//!
//! The public API does not expose winit types; the window runtime translates
//! platform events into [`InputEvent`]s.

pub(crate) mod platform;
mod state;
mod types;

pub use state::Input;
pub use types::{ButtonState, InputEvent, Key, MouseButton};

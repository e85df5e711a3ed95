//! Contract between the window runtime and whatever it runs.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;

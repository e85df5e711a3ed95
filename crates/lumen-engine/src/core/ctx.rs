use winit::window::Window;

use crate::coords::Viewport;
use crate::device::{Gpu, SurfaceErrorAction};
use crate::input::Input;
use crate::time::GameTime;

use super::app::AppControl;

/// Per-frame context passed to [`App::on_frame`](super::App::on_frame).
///
/// `'a` is the callback, `'w` the window borrow carried by `Gpu<'w>`.
pub struct FrameCtx<'a, 'w> {
    pub window: &'a Window,
    pub gpu: &'a mut Gpu<'w>,
    pub input: &'a Input,
    pub time: GameTime,
}

impl FrameCtx<'_, '_> {
    /// Drawable size in physical pixels.
    pub fn screen_size(&self) -> Viewport {
        let size = self.gpu.size();
        Viewport::from_pixels(size.width, size.height)
    }

    /// Acquires the swapchain image, lets `draw` encode into it, then submits
    /// and presents. Surface errors skip the frame unless they are fatal.
    pub fn present<F>(&mut self, draw: F) -> AppControl
    where
        F: FnOnce(&mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let mut frame = match self.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => {
                        log::error!("surface out of memory");
                        AppControl::Exit
                    }
                    _ => AppControl::Continue,
                };
            }
        };

        draw(&mut frame.encoder, &frame.view);

        self.window.pre_present_notify();
        self.gpu.submit(frame);
        AppControl::Continue
    }
}

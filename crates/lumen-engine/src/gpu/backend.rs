use crate::any::AsAny;
use crate::error::Result;
use crate::paint::{BlendMode, Color};

use super::{ImageId, ProgramId, ShaderSource, TargetId, UniformValue};

/// Immediate, stateful GPU surface the batching engine is written against.
///
/// Calls mirror a bind-then-draw API: state set through `use_program`,
/// `set_blend_mode`, `set_uniform`, `bind_texture`, `upload_attribute` and
/// `bind_target` stays in effect until changed, and `draw_triangles` draws
/// with whatever is bound at that moment.
pub trait GpuBackend: AsAny {
    fn compile_program(&mut self, source: &ShaderSource) -> Result<ProgramId>;
    fn use_program(&mut self, program: ProgramId);
    fn enable_attribute(&mut self, location: u32);
    fn disable_attribute(&mut self, location: u32);
    fn set_blend_mode(&mut self, mode: BlendMode);
    fn set_uniform(&mut self, program: ProgramId, location: u32, value: &UniformValue);
    fn bind_texture(&mut self, unit: u32, image: ImageId);
    fn upload_attribute(&mut self, location: u32, data: &[f32], components: u32);
    fn draw_triangles(&mut self, vertex_count: u32);

    /// `None` binds the screen.
    fn bind_target(&mut self, target: Option<TargetId>);
    fn set_viewport(&mut self, width: u32, height: u32);
    fn clear(&mut self, color: Color);

    /// Allocates an RGBA8 image. `None` leaves the contents zeroed.
    fn create_image(&mut self, width: u32, height: u32, rgba: Option<&[u8]>) -> Result<ImageId>;
    /// Allocates an offscreen target and the image it renders into.
    fn create_target(&mut self, width: u32, height: u32) -> Result<(TargetId, ImageId)>;

    fn screen_size(&self) -> (u32, u32);
    fn resize_screen(&mut self, width: u32, height: u32);

    /// Ends the frame. Recorded state that only lives for one frame is dropped.
    fn end_frame(&mut self);
}

pub(crate) fn check_image_len(width: u32, height: u32, rgba: Option<&[u8]>) -> Result<()> {
    if let Some(bytes) = rgba {
        let expected = width as usize * height as usize * 4;
        if bytes.len() != expected {
            return Err(crate::error::EngineError::InvalidImage { width, height, len: bytes.len() });
        }
    }
    Ok(())
}

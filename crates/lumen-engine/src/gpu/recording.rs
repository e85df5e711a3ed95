use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;
use crate::paint::{BlendMode, Color};

use super::backend::check_image_len;
use super::{GpuBackend, ImageId, ProgramId, ShaderSource, TargetId, UniformValue};

/// One call made against a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    CompileProgram { program: ProgramId, name: String },
    UseProgram(ProgramId),
    EnableAttribute(u32),
    DisableAttribute(u32),
    SetBlendMode(BlendMode),
    SetUniform { program: ProgramId, location: u32, value: UniformValue },
    BindTexture { unit: u32, image: ImageId },
    UploadAttribute { location: u32, data: Vec<f32>, components: u32 },
    DrawTriangles(u32),
    BindTarget(Option<TargetId>),
    SetViewport(u32, u32),
    Clear(Color),
    CreateImage { image: ImageId, width: u32, height: u32 },
    CreateTarget { target: TargetId, image: ImageId, width: u32, height: u32 },
    EndFrame,
}

pub type CommandLog = Rc<RefCell<Vec<GpuCommand>>>;

/// Headless backend that appends every call to a shared log.
///
/// Used by tests and by runs without a window.
pub struct RecordingBackend {
    log: CommandLog,
    screen: (u32, u32),
    next_program: u32,
    next_image: u32,
    next_target: u32,
}

impl RecordingBackend {
    pub fn new() -> (Self, CommandLog) {
        Self::with_screen(1280, 720)
    }

    pub fn with_screen(width: u32, height: u32) -> (Self, CommandLog) {
        let log = CommandLog::default();
        let backend = Self {
            log: Rc::clone(&log),
            screen: (width, height),
            next_program: 0,
            next_image: 0,
            next_target: 0,
        };
        (backend, log)
    }

    fn record(&self, cmd: GpuCommand) {
        log::trace!("gpu: {cmd:?}");
        self.log.borrow_mut().push(cmd);
    }
}

impl GpuBackend for RecordingBackend {
    fn compile_program(&mut self, source: &ShaderSource) -> Result<ProgramId> {
        let program = ProgramId(self.next_program);
        self.next_program += 1;
        self.record(GpuCommand::CompileProgram { program, name: source.name.clone() });
        Ok(program)
    }

    fn use_program(&mut self, program: ProgramId) {
        self.record(GpuCommand::UseProgram(program));
    }

    fn enable_attribute(&mut self, location: u32) {
        self.record(GpuCommand::EnableAttribute(location));
    }

    fn disable_attribute(&mut self, location: u32) {
        self.record(GpuCommand::DisableAttribute(location));
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.record(GpuCommand::SetBlendMode(mode));
    }

    fn set_uniform(&mut self, program: ProgramId, location: u32, value: &UniformValue) {
        self.record(GpuCommand::SetUniform { program, location, value: *value });
    }

    fn bind_texture(&mut self, unit: u32, image: ImageId) {
        self.record(GpuCommand::BindTexture { unit, image });
    }

    fn upload_attribute(&mut self, location: u32, data: &[f32], components: u32) {
        self.record(GpuCommand::UploadAttribute { location, data: data.to_vec(), components });
    }

    fn draw_triangles(&mut self, vertex_count: u32) {
        self.record(GpuCommand::DrawTriangles(vertex_count));
    }

    fn bind_target(&mut self, target: Option<TargetId>) {
        self.record(GpuCommand::BindTarget(target));
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.record(GpuCommand::SetViewport(width, height));
    }

    fn clear(&mut self, color: Color) {
        self.record(GpuCommand::Clear(color));
    }

    fn create_image(&mut self, width: u32, height: u32, rgba: Option<&[u8]>) -> Result<ImageId> {
        check_image_len(width, height, rgba)?;
        let image = ImageId(self.next_image);
        self.next_image += 1;
        self.record(GpuCommand::CreateImage { image, width, height });
        Ok(image)
    }

    fn create_target(&mut self, width: u32, height: u32) -> Result<(TargetId, ImageId)> {
        let image = ImageId(self.next_image);
        self.next_image += 1;
        let target = TargetId(self.next_target);
        self.next_target += 1;
        self.record(GpuCommand::CreateTarget { target, image, width, height });
        Ok((target, image))
    }

    fn screen_size(&self) -> (u32, u32) {
        self.screen
    }

    fn resize_screen(&mut self, width: u32, height: u32) {
        self.screen = (width, height);
    }

    fn end_frame(&mut self) {
        self.record(GpuCommand::EndFrame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_distinct() {
        let (mut gpu, log) = RecordingBackend::new();
        let a = gpu.create_image(1, 1, None).unwrap();
        let (_, b) = gpu.create_target(4, 4).unwrap();
        assert_ne!(a, b);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn rejects_short_pixel_data() {
        let (mut gpu, _) = RecordingBackend::new();
        assert!(gpu.create_image(2, 2, Some(&[0; 4])).is_err());
    }
}

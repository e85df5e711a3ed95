use crate::any::AsAny;
use crate::error::Result;
use crate::graphics::builtin::MATRIX_UNIFORM;
use crate::graphics::{Graphics, RenderTarget, ShaderId};
use crate::paint::{BlendMode, Color};
use crate::scene::Scene;

use super::Camera;

/// A render pass over a scene.
///
/// The scene calls `pre_render`, `render` and `post_render` in that order for
/// every visible renderer, in the order they were added.
pub trait Renderer: AsAny {
    fn visible(&self) -> bool {
        true
    }

    /// Called once per scene update, after entities.
    fn update(&mut self, _scene: &Scene) {}

    fn pre_render(&mut self, _scene: &mut Scene, _gfx: &mut Graphics) -> Result<()> {
        Ok(())
    }

    fn render(&mut self, scene: &mut Scene, gfx: &mut Graphics) -> Result<()>;

    fn post_render(&mut self, _scene: &mut Scene, _gfx: &mut Graphics) -> Result<()> {
        Ok(())
    }
}

/// Target, camera and GPU state shared by the stock renderers.
#[derive(Debug, Clone)]
pub struct RenderPass {
    pub visible: bool,
    pub camera: Camera,
    /// `None` draws into the graphics' internal buffer.
    pub target: Option<RenderTarget>,
    pub clear: Option<Color>,
    /// `None` uses the built-in texture shader.
    pub shader: Option<ShaderId>,
    pub blend: BlendMode,
}

impl Default for RenderPass {
    fn default() -> Self {
        Self {
            visible: true,
            camera: Camera::default(),
            target: None,
            clear: None,
            shader: None,
            blend: BlendMode::NORMAL,
        }
    }
}

impl RenderPass {
    /// Binds the target, clears it, selects shader and blend mode and pushes
    /// the camera matrix.
    pub fn begin(&mut self, gfx: &mut Graphics) -> Result<()> {
        let target = self.target.unwrap_or(*gfx.buffer());
        gfx.set_render_target(Some(&target));
        if let Some(color) = self.clear {
            gfx.clear(color);
        }

        let shader = self.shader.unwrap_or(gfx.texture_shader());
        gfx.set_shader(shader);
        gfx.set_blend_mode(self.blend);

        self.camera.set_viewport(target.viewport());
        gfx.set_uniform(shader, MATRIX_UNIFORM, self.camera.matrix())
    }
}

/// Draws every attached entity in depth order.
#[derive(Debug, Clone, Default)]
pub struct EverythingRenderer {
    pub pass: RenderPass,
    /// Outline color for collider debug drawing; `None` disables it.
    pub debug_colliders: Option<Color>,
}

impl EverythingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.pass.camera = camera;
        self
    }

    pub fn with_target(mut self, target: RenderTarget) -> Self {
        self.pass.target = Some(target);
        self
    }

    pub fn with_clear(mut self, color: Color) -> Self {
        self.pass.clear = Some(color);
        self
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.pass.camera
    }
}

impl Renderer for EverythingRenderer {
    fn visible(&self) -> bool {
        self.pass.visible
    }

    fn pre_render(&mut self, _scene: &mut Scene, gfx: &mut Graphics) -> Result<()> {
        self.pass.begin(gfx)
    }

    fn render(&mut self, scene: &mut Scene, gfx: &mut Graphics) -> Result<()> {
        scene.render_all(gfx, Some(&self.pass.camera));
        if let Some(color) = self.debug_colliders {
            scene.debug_draw_colliders(gfx, color);
        }
        Ok(())
    }
}

/// Draws only the entities of the named groups, group by group.
#[derive(Debug, Clone, Default)]
pub struct GroupRenderer {
    pub pass: RenderPass,
    pub groups: Vec<String>,
}

impl GroupRenderer {
    pub fn new<S: Into<String>>(groups: impl IntoIterator<Item = S>) -> Self {
        Self { pass: RenderPass::default(), groups: groups.into_iter().map(Into::into).collect() }
    }

    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.pass.camera = camera;
        self
    }

    pub fn with_target(mut self, target: RenderTarget) -> Self {
        self.pass.target = Some(target);
        self
    }

    pub fn with_clear(mut self, color: Color) -> Self {
        self.pass.clear = Some(color);
        self
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.pass.camera
    }
}

impl Renderer for GroupRenderer {
    fn visible(&self) -> bool {
        self.pass.visible
    }

    fn pre_render(&mut self, _scene: &mut Scene, gfx: &mut Graphics) -> Result<()> {
        self.pass.begin(gfx)
    }

    fn render(&mut self, scene: &mut Scene, gfx: &mut Graphics) -> Result<()> {
        for group in &self.groups {
            scene.render_group(group, gfx, Some(&self.pass.camera));
        }
        Ok(())
    }
}

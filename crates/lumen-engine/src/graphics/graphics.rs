use crate::assets::{GpuImage, Texture};
use crate::coords::{Mat3, Rect, Vec2, Viewport};
use crate::error::{AssertMode, Result};
use crate::gpu::{AttributeRole, GpuBackend, ShaderSource, TargetId, UniformValue};
use crate::paint::{BlendMode, Color};

use super::builtin::{self, MATRIX_UNIFORM};
use super::{GraphicsConfig, RenderTarget, Shader, ShaderId};

/// Optional transform and styling for [`Graphics::texture`] and [`Graphics::quad`].
///
/// Corners are offset by `origin`, then scaled, then rotated (radians).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawParams {
    pub crop: Option<Rect>,
    pub color: Color,
    pub origin: Vec2,
    pub scale: Vec2,
    pub rotation: f32,
    pub flip_x: bool,
    pub flip_y: bool,
}

impl Default for DrawParams {
    fn default() -> Self {
        Self {
            crop: None,
            color: Color::white(),
            origin: Vec2::zero(),
            scale: Vec2::one(),
            rotation: 0.0,
            flip_x: false,
            flip_y: false,
        }
    }
}

impl DrawParams {
    pub fn crop(mut self, crop: Rect) -> Self {
        self.crop = Some(crop);
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    pub fn scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    pub fn rotation(mut self, radians: f32) -> Self {
        self.rotation = radians;
        self
    }

    pub fn flip(mut self, x: bool, y: bool) -> Self {
        self.flip_x = x;
        self.flip_y = y;
        self
    }
}

#[derive(Debug, Copy, Clone)]
struct Builtins {
    texture: ShaderId,
    solid: ShaderId,
    primitive: ShaderId,
}

/// Batching draw engine.
///
/// Geometry accumulates in three parallel arrays (positions, texcoords,
/// colors) and is flushed as one draw call whenever the shader, blend mode,
/// render target or a uniform changes. All GPU state changes happen in
/// [`Graphics::check_state`] right after such a flush.
pub struct Graphics {
    backend: Box<dyn GpuBackend>,
    config: GraphicsConfig,

    shaders: Vec<Shader>,
    builtins: Builtins,
    current: Option<ShaderId>,
    next_shader: Option<ShaderId>,
    blend: BlendMode,
    next_blend: Option<BlendMode>,

    vertices: Vec<f32>,
    texcoords: Vec<f32>,
    colors: Vec<f32>,

    target: Option<TargetId>,
    target_size: Viewport,
    buffer: RenderTarget,
    pixel: Texture,
    screen: Viewport,
    draw_calls: u32,
}

impl Graphics {
    /// Compiles the built-in shaders, creates the pixel texture and the internal buffer.
    pub fn new(mut backend: Box<dyn GpuBackend>, config: GraphicsConfig) -> Result<Self> {
        let (sw, sh) = backend.screen_size();

        let mut shaders = Vec::with_capacity(3);
        let mut compile = |backend: &mut Box<dyn GpuBackend>, source: ShaderSource| -> Result<ShaderId> {
            let program = backend.compile_program(&source)?;
            shaders.push(Shader::new(program, &source)?);
            Ok(ShaderId(shaders.len() - 1))
        };
        let builtins = Builtins {
            texture: compile(&mut backend, builtin::texture())?,
            solid: compile(&mut backend, builtin::solid())?,
            primitive: compile(&mut backend, builtin::primitive())?,
        };

        let pixel_id = backend.create_image(1, 1, Some(&[255, 255, 255, 255]))?;
        let pixel = Texture::from_image(GpuImage { id: pixel_id, width: 1, height: 1 });

        let (bw, bh) = (config.buffer_width.max(1), config.buffer_height.max(1));
        let (target_id, image) = backend.create_target(bw, bh)?;
        let buffer = RenderTarget {
            id: target_id,
            texture: Texture::from_image(GpuImage { id: image, width: bw, height: bh }),
            width: bw,
            height: bh,
        };

        log::debug!("graphics ready: buffer {bw}x{bh}, screen {sw}x{sh}");

        Ok(Self {
            backend,
            config,
            shaders,
            builtins,
            current: None,
            next_shader: None,
            blend: BlendMode::NORMAL,
            next_blend: None,
            vertices: Vec::new(),
            texcoords: Vec::new(),
            colors: Vec::new(),
            target: None,
            target_size: Viewport::from_pixels(sw, sh),
            buffer,
            pixel,
            screen: Viewport::from_pixels(sw, sh),
            draw_calls: 0,
        })
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &GraphicsConfig {
        &self.config
    }

    pub fn assert_mode(&self) -> AssertMode {
        self.config.assert_mode
    }

    pub fn backend(&self) -> &dyn GpuBackend {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> &mut dyn GpuBackend {
        self.backend.as_mut()
    }

    pub fn draw_calls(&self) -> u32 {
        self.draw_calls
    }

    pub fn screen(&self) -> Viewport {
        self.screen
    }

    pub fn buffer(&self) -> &RenderTarget {
        &self.buffer
    }

    pub fn pixel(&self) -> &Texture {
        &self.pixel
    }

    /// Size of the currently bound target (buffer, offscreen target or screen).
    pub fn target_size(&self) -> Viewport {
        self.target_size
    }

    pub fn texture_shader(&self) -> ShaderId {
        self.builtins.texture
    }

    pub fn solid_shader(&self) -> ShaderId {
        self.builtins.solid
    }

    pub fn primitive_shader(&self) -> ShaderId {
        self.builtins.primitive
    }

    pub fn shader(&self, id: ShaderId) -> Option<&Shader> {
        self.shaders.get(id.0)
    }

    /// Uniform writes through [`Shader::set`] keep dirty tracking intact.
    pub fn shader_mut(&mut self, id: ShaderId) -> Option<&mut Shader> {
        self.shaders.get_mut(id.0)
    }

    /// Pending shader if a swap is queued, else the bound one.
    pub fn active_shader(&self) -> Option<ShaderId> {
        self.next_shader.or(self.current)
    }

    pub fn orthographic(width: f32, height: f32) -> Mat3 {
        Mat3::orthographic(width, height)
    }

    // ── resources ─────────────────────────────────────────────────────────

    pub fn create_shader(&mut self, source: &ShaderSource) -> Result<ShaderId> {
        let program = self.backend.compile_program(source)?;
        self.shaders.push(Shader::new(program, source)?);
        Ok(ShaderId(self.shaders.len() - 1))
    }

    pub fn create_texture(&mut self, width: u32, height: u32, rgba: Option<&[u8]>) -> Result<Texture> {
        let id = self.backend.create_image(width, height, rgba)?;
        Ok(Texture::from_image(GpuImage { id, width, height }))
    }

    pub fn create_target(&mut self, width: u32, height: u32) -> Result<RenderTarget> {
        let (id, image) = self.backend.create_target(width, height)?;
        Ok(RenderTarget {
            id,
            texture: Texture::from_image(GpuImage { id: image, width, height }),
            width,
            height,
        })
    }

    pub fn resize(&mut self, screen: Viewport) {
        self.screen = screen;
        self.backend.resize_screen(screen.width as u32, screen.height as u32);
        if self.target.is_none() {
            self.target_size = screen;
        }
    }

    // ── state ─────────────────────────────────────────────────────────────

    /// Queues a shader swap, applied at the next state check.
    pub fn set_shader(&mut self, id: ShaderId) {
        if self.current == Some(id) {
            self.next_shader = None;
        } else {
            self.next_shader = Some(id);
        }
    }

    /// Queues a blend mode change, applied at the next state check.
    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        if mode == self.blend {
            self.next_blend = None;
        } else {
            self.next_blend = Some(mode);
        }
    }

    pub fn set_uniform(&mut self, shader: ShaderId, name: &str, value: impl Into<UniformValue>) -> Result<()> {
        match self.shaders.get_mut(shader.0) {
            Some(s) => s.set(name, value),
            None => Err(crate::error::EngineError::UnknownUniform {
                shader: format!("{shader:?}"),
                name: name.to_owned(),
            }),
        }
    }

    /// Sets the projection uniform on the active shader.
    pub fn set_matrix(&mut self, matrix: Mat3) -> Result<()> {
        let shader = self.ensure_shader();
        self.set_uniform(shader, MATRIX_UNIFORM, matrix)
    }

    fn ensure_shader(&mut self) -> ShaderId {
        match self.active_shader() {
            Some(id) => id,
            None => {
                self.next_shader = Some(self.builtins.texture);
                self.builtins.texture
            }
        }
    }

    /// Flushes under the old state, then applies any pending shader swap,
    /// blend change and dirty uniforms.
    pub fn check_state(&mut self) {
        if self.current.is_none() && self.next_shader.is_none() {
            self.next_shader = Some(self.builtins.texture);
        }
        let swapping = self.next_shader.is_some_and(|n| Some(n) != self.current);
        if !swapping {
            self.next_shader = None;
        }
        let blending = self.next_blend.is_some();
        let dirty = self.current.and_then(|id| self.shaders.get(id.0)).is_some_and(Shader::is_dirty);

        if !(swapping || blending || dirty) {
            return;
        }

        self.flush();

        if swapping {
            if let Some(old) = self.current.and_then(|id| self.shaders.get(id.0)) {
                for attr in old.attributes() {
                    self.backend.disable_attribute(attr.location);
                }
            }
            self.current = self.next_shader.take();
            if let Some(new) = self.current.and_then(|id| self.shaders.get(id.0)) {
                for attr in new.attributes() {
                    self.backend.enable_attribute(attr.location);
                }
                self.backend.use_program(new.program());
                log::trace!("shader -> {}", new.name());
            }
        }

        if let Some(mode) = self.next_blend.take() {
            self.backend.set_blend_mode(mode);
            self.blend = mode;
        }

        let Some(shader) = self.current.and_then(|id| self.shaders.get_mut(id.0)) else { return };
        let mut unit = 0u32;
        for uniform in shader.uniforms() {
            if !(swapping || uniform.is_dirty()) {
                continue;
            }
            match uniform.value() {
                UniformValue::Sampler(Some(image)) => {
                    self.backend.bind_texture(unit, *image);
                    self.backend.set_uniform(shader.program(), uniform.location(), &UniformValue::Int(unit as i32));
                    unit += 1;
                }
                UniformValue::Sampler(None) => {}
                value => self.backend.set_uniform(shader.program(), uniform.location(), value),
            }
        }
        shader.clear_dirty();
    }

    /// Issues one draw call for everything batched so far.
    pub fn flush(&mut self) {
        if self.vertices.is_empty() {
            return;
        }
        if let Some(shader) = self.current.and_then(|id| self.shaders.get(id.0)) {
            for attr in shader.attributes() {
                let data = match attr.role {
                    AttributeRole::Position => &self.vertices,
                    AttributeRole::Texcoord => &self.texcoords,
                    AttributeRole::Color => &self.colors,
                };
                self.backend.upload_attribute(attr.location, data, attr.role.components());
            }
            let count = (self.vertices.len() / 2) as u32;
            self.backend.draw_triangles(count);
            self.draw_calls += 1;
            log::trace!("flush: {count} vertices with {}", shader.name());
        }
        self.vertices.clear();
        self.texcoords.clear();
        self.colors.clear();
    }

    /// Binds `target`, or the screen for `None`. No-op if already bound.
    pub fn set_render_target(&mut self, target: Option<&RenderTarget>) {
        let id = target.map(|t| t.id);
        if id == self.target {
            return;
        }
        self.flush();
        self.bind_target(id, target.map_or(self.screen, RenderTarget::viewport));
    }

    fn bind_target(&mut self, id: Option<TargetId>, size: Viewport) {
        self.backend.bind_target(id);
        self.backend.set_viewport(size.width as u32, size.height as u32);
        self.target = id;
        self.target_size = size;
    }

    pub fn current_target(&self) -> Option<TargetId> {
        self.target
    }

    pub fn clear(&mut self, color: Color) {
        self.flush();
        self.backend.clear(color);
    }

    // ── frame ─────────────────────────────────────────────────────────────

    /// Starts a frame: counters reset, shader state forgotten so the next
    /// check rebinds everything, internal buffer bound and cleared.
    pub fn reset(&mut self) {
        self.vertices.clear();
        self.texcoords.clear();
        self.colors.clear();
        self.draw_calls = 0;
        if self.next_shader.is_none() {
            self.next_shader = self.current;
        }
        self.current = None;
        self.next_blend = Some(self.next_blend.unwrap_or(self.blend));
        let buffer = self.buffer;
        self.bind_target(Some(buffer.id), buffer.viewport());
        self.backend.clear(self.config.clear_color);
    }

    /// Where the internal buffer lands on the screen.
    pub fn output_bounds(&self) -> Rect {
        self.config.resolution.output_bounds(self.buffer.viewport(), self.screen)
    }

    /// Maps a window-space point into buffer space.
    pub fn screen_to_buffer(&self, point: Vec2) -> Vec2 {
        let out = self.output_bounds();
        let sx = self.buffer.width as f32 / out.width.max(f32::EPSILON);
        let sy = self.buffer.height as f32 / out.height.max(f32::EPSILON);
        Vec2::new((point.x - out.x) * sx, (point.y - out.y) * sy)
    }

    /// Draws the internal buffer onto the screen.
    pub fn finalize(&mut self) -> Result<()> {
        self.set_render_target(None);
        self.clear(self.config.border_color);

        let shader = self.builtins.texture;
        self.set_shader(shader);
        self.set_blend_mode(BlendMode::NORMAL);
        self.set_uniform(shader, MATRIX_UNIFORM, Mat3::orthographic(self.screen.width, self.screen.height))?;

        let out = self.output_bounds();
        let buffer = self.buffer;
        let scale = Vec2::new(out.width / buffer.width as f32, out.height / buffer.height as f32);
        self.texture(&buffer.texture, out.position(), DrawParams::default().scale(scale));
        self.flush();
        Ok(())
    }

    /// Hands the finished frame to the backend.
    pub fn end_frame(&mut self) {
        self.backend.end_frame();
    }

    // ── vertices ──────────────────────────────────────────────────────────

    /// Appends a vertex after checking state.
    pub fn push(&mut self, x: f32, y: f32, u: f32, v: f32, color: Color) {
        self.check_state();
        self.push_unsafe(x, y, u, v, color);
    }

    /// Appends a vertex without a state check. Only valid while the state
    /// has not changed since the last [`Graphics::push`].
    pub fn push_unsafe(&mut self, x: f32, y: f32, u: f32, v: f32, color: Color) {
        self.vertices.extend_from_slice(&[x, y]);
        self.texcoords.extend_from_slice(&[u, v]);
        self.colors.extend_from_slice(&color.to_array());
    }

    pub fn batched_vertices(&self) -> usize {
        self.vertices.len() / 2
    }

    /// Points the active shader's sampler at `image`. Returns whether it has one.
    fn bind_sampler(&mut self, image: GpuImage) -> bool {
        let id = self.ensure_shader();
        self.shaders.get_mut(id.0).is_some_and(|s| s.set_texture(image.id))
    }

    /// UV of the pixel texture when the active shader samples, else zero.
    fn pixel_uv(&mut self) -> (f32, f32) {
        let pixel = self.pixel;
        if self.bind_sampler(pixel.image) {
            let (u0, v0, u1, v1) = pixel.uv_rect();
            ((u0 + u1) * 0.5, (v0 + v1) * 0.5)
        } else {
            (0.0, 0.0)
        }
    }

    // ── textured quads ────────────────────────────────────────────────────

    /// Draws `tex` at `position` as two triangles (TL, TR, BR, TL, BR, BL).
    pub fn texture(&mut self, tex: &Texture, position: Vec2, params: DrawParams) {
        let tex = match params.crop {
            Some(clip) => tex.subtexture(clip),
            None => *tex,
        };

        if !self.bind_sampler(tex.image) {
            let name = self.active_shader().and_then(|id| self.shader(id)).map_or("?", Shader::name).to_owned();
            self.config.assert_mode.check(false, || format!("texture drawn with shader `{name}` which has no sampler2D"));
        }

        let left = -tex.frame.x;
        let top = -tex.frame.y;
        let corners = [
            Vec2::new(left, top),
            Vec2::new(left + tex.bounds.width, top),
            Vec2::new(left + tex.bounds.width, top + tex.bounds.height),
            Vec2::new(left, top + tex.bounds.height),
        ];

        let (mut u0, mut v0, mut u1, mut v1) = tex.uv_rect();
        if params.flip_x {
            std::mem::swap(&mut u0, &mut u1);
        }
        if params.flip_y {
            std::mem::swap(&mut v0, &mut v1);
        }
        let uvs = [(u0, v0), (u1, v0), (u1, v1), (u0, v1)];
        self.emit_quad(position, corners, uvs, &params);
    }

    /// Same corner pipeline as [`Graphics::texture`] over `size`, with zero UVs.
    pub fn quad(&mut self, position: Vec2, size: Vec2, params: DrawParams) {
        self.pixel_uv();
        let corners = [Vec2::zero(), Vec2::new(size.x, 0.0), size, Vec2::new(0.0, size.y)];
        self.emit_quad(position, corners, [(0.0, 0.0); 4], &params);
    }

    fn emit_quad(&mut self, position: Vec2, corners: [Vec2; 4], uvs: [(f32, f32); 4], params: &DrawParams) {
        let (sin, cos) = params.rotation.sin_cos();
        let p = corners.map(|c| {
            let c = (c - params.origin).scaled(params.scale);
            let c = if params.rotation != 0.0 { c.rotated(sin, cos) } else { c };
            position + c
        });
        let color = params.color;
        self.push(p[0].x, p[0].y, uvs[0].0, uvs[0].1, color);
        for i in [1, 2, 0, 2, 3] {
            self.push_unsafe(p[i].x, p[i].y, uvs[i].0, uvs[i].1, color);
        }
    }

    // ── primitives ────────────────────────────────────────────────────────

    pub fn rect(&mut self, rect: Rect, color: Color) {
        let (u, v) = self.pixel_uv();
        let (l, t, r, b) = (rect.left(), rect.top(), rect.right(), rect.bottom());
        self.push(l, t, u, v, color);
        self.push_unsafe(r, t, u, v, color);
        self.push_unsafe(r, b, u, v, color);
        self.push_unsafe(l, t, u, v, color);
        self.push_unsafe(r, b, u, v, color);
        self.push_unsafe(l, b, u, v, color);
    }

    /// Outline of `rect`, `thickness` pixels wide, inside its bounds.
    pub fn hollow_rect(&mut self, rect: Rect, thickness: f32, color: Color) {
        let t = thickness.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0);
        self.rect(Rect::new(rect.x, rect.y, rect.width, t), color);
        self.rect(Rect::new(rect.x, rect.bottom() - t, rect.width, t), color);
        self.rect(Rect::new(rect.x, rect.y + t, t, rect.height - 2.0 * t), color);
        self.rect(Rect::new(rect.right() - t, rect.y + t, t, rect.height - 2.0 * t), color);
    }

    pub fn triangle(&mut self, a: Vec2, b: Vec2, c: Vec2, color: Color) {
        let (u, v) = self.pixel_uv();
        self.push(a.x, a.y, u, v, color);
        self.push_unsafe(b.x, b.y, u, v, color);
        self.push_unsafe(c.x, c.y, u, v, color);
    }

    /// Filled circle as a fan of `steps` triangles.
    pub fn circle(&mut self, center: Vec2, radius: f32, steps: u32, color: Color) {
        let steps = steps.max(3);
        let (u, v) = self.pixel_uv();
        let at = |i: u32| {
            let angle = i as f32 / steps as f32 * std::f32::consts::TAU;
            center + Vec2::new(angle.cos(), angle.sin()) * radius
        };
        let mut last = at(0);
        for i in 1..=steps {
            let next = at(i);
            if i == 1 {
                self.push(center.x, center.y, u, v, color);
            } else {
                self.push_unsafe(center.x, center.y, u, v, color);
            }
            self.push_unsafe(last.x, last.y, u, v, color);
            self.push_unsafe(next.x, next.y, u, v, color);
            last = next;
        }
    }

    /// Segment `from`→`to` as a quad `thickness` pixels wide.
    pub fn line(&mut self, from: Vec2, to: Vec2, thickness: f32, color: Color) {
        let dir = (to - from).normalized();
        if dir == Vec2::zero() {
            return;
        }
        let n = Vec2::new(-dir.y, dir.x) * (thickness * 0.5);
        let (u, v) = self.pixel_uv();
        let (a, b, c, d) = (from + n, to + n, to - n, from - n);
        self.push(a.x, a.y, u, v, color);
        self.push_unsafe(b.x, b.y, u, v, color);
        self.push_unsafe(c.x, c.y, u, v, color);
        self.push_unsafe(a.x, a.y, u, v, color);
        self.push_unsafe(c.x, c.y, u, v, color);
        self.push_unsafe(d.x, d.y, u, v, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{CommandLog, GpuCommand, RecordingBackend};
    use approx::assert_abs_diff_eq;

    fn gfx() -> (Graphics, CommandLog) {
        let (backend, log) = RecordingBackend::with_screen(1280, 720);
        let g = Graphics::new(Box::new(backend), GraphicsConfig::default()).unwrap();
        log.borrow_mut().clear();
        (g, log)
    }

    fn count(log: &CommandLog, pred: impl Fn(&GpuCommand) -> bool) -> usize {
        log.borrow().iter().filter(|c| pred(c)).count()
    }

    fn draws(log: &CommandLog) -> Vec<u32> {
        log.borrow()
            .iter()
            .filter_map(|c| match c {
                GpuCommand::DrawTriangles(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    fn positions(log: &CommandLog) -> Vec<f32> {
        log.borrow()
            .iter()
            .rev()
            .find_map(|c| match c {
                GpuCommand::UploadAttribute { location: 0, data, .. } => Some(data.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    fn white_texture(g: &mut Graphics, w: u32, h: u32) -> Texture {
        g.create_texture(w, h, None).unwrap()
    }

    // ── batching ──────────────────────────────────────────────────────────

    #[test]
    fn flush_with_nothing_batched_is_noop() {
        let (mut g, log) = gfx();
        g.flush();
        assert!(draws(&log).is_empty());
        assert_eq!(g.draw_calls(), 0);
    }

    #[test]
    fn same_state_batches_into_one_draw() {
        let (mut g, log) = gfx();
        g.rect(Rect::new(0.0, 0.0, 4.0, 4.0), Color::red());
        g.rect(Rect::new(8.0, 0.0, 4.0, 4.0), Color::blue());
        g.flush();
        assert_eq!(draws(&log), vec![12]);
        assert_eq!(g.draw_calls(), 1);
    }

    #[test]
    fn shader_swap_flushes_under_old_shader() {
        let (mut g, log) = gfx();
        g.rect(Rect::new(0.0, 0.0, 4.0, 4.0), Color::white());
        let solid = g.solid_shader();
        g.set_shader(solid);
        g.rect(Rect::new(0.0, 0.0, 4.0, 4.0), Color::white());
        g.flush();

        let log_ref = log.borrow();
        let first_draw = log_ref.iter().position(|c| matches!(c, GpuCommand::DrawTriangles(_))).unwrap();
        let solid_program = g.shader(solid).unwrap().program();
        let swap = log_ref.iter().position(|c| *c == GpuCommand::UseProgram(solid_program)).unwrap();
        assert!(first_draw < swap, "old batch must flush before the program switch");
        drop(log_ref);
        assert_eq!(g.draw_calls(), 2);
    }

    #[test]
    fn swap_disables_old_attributes_and_enables_new() {
        let (mut g, log) = gfx();
        g.rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::white());
        log.borrow_mut().clear();
        let prim = g.primitive_shader();
        g.set_shader(prim);
        g.rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::white());
        assert_eq!(count(&log, |c| matches!(c, GpuCommand::DisableAttribute(_))), 3);
        assert_eq!(count(&log, |c| matches!(c, GpuCommand::EnableAttribute(_))), 2);
    }

    #[test]
    fn blend_change_flushes_and_applies() {
        let (mut g, log) = gfx();
        g.rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::white());
        g.set_blend_mode(BlendMode::ADD);
        g.rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::white());
        g.flush();
        assert_eq!(draws(&log), vec![6, 6]);
        assert_eq!(count(&log, |c| *c == GpuCommand::SetBlendMode(BlendMode::ADD)), 1);
    }

    #[test]
    fn setting_same_blend_mode_does_not_flush() {
        let (mut g, log) = gfx();
        g.rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::white());
        g.set_blend_mode(BlendMode::NORMAL);
        g.rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::white());
        g.flush();
        assert_eq!(draws(&log), vec![12]);
    }

    #[test]
    fn dirty_uniform_flushes_and_uploads_only_that_uniform() {
        let (mut g, log) = gfx();
        g.rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::white());
        log.borrow_mut().clear();

        let mut m = Mat3::identity();
        m.translate(5.0, 0.0);
        g.set_matrix(m).unwrap();
        g.rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::white());

        assert_eq!(draws(&log), vec![6]);
        let uploads: Vec<_> = log
            .borrow()
            .iter()
            .filter(|c| matches!(c, GpuCommand::SetUniform { .. }))
            .cloned()
            .collect();
        assert_eq!(uploads.len(), 1);
        assert!(matches!(uploads[0], GpuCommand::SetUniform { location: 0, value: UniformValue::Mat3(_), .. }));
    }

    #[test]
    fn unchanged_uniform_does_not_break_batch() {
        let (mut g, log) = gfx();
        g.set_matrix(Mat3::identity()).unwrap();
        g.rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::white());
        g.set_matrix(Mat3::identity()).unwrap();
        g.rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::white());
        g.flush();
        assert_eq!(draws(&log), vec![12]);
    }

    #[test]
    fn texture_switch_binds_new_unit() {
        let (mut g, log) = gfx();
        let a = white_texture(&mut g, 8, 8);
        let b = white_texture(&mut g, 8, 8);
        g.texture(&a, Vec2::zero(), DrawParams::default());
        g.texture(&b, Vec2::zero(), DrawParams::default());
        g.flush();
        assert_eq!(draws(&log), vec![6, 6]);
        assert_eq!(count(&log, |c| *c == GpuCommand::BindTexture { unit: 0, image: b.image.id }), 1);
    }

    // ── geometry ──────────────────────────────────────────────────────────

    #[test]
    fn texture_vertex_order_and_uvs() {
        let (mut g, log) = gfx();
        let tex = white_texture(&mut g, 16, 8);
        g.texture(&tex, Vec2::new(10.0, 20.0), DrawParams::default());
        g.flush();
        assert_eq!(
            positions(&log),
            vec![10.0, 20.0, 26.0, 20.0, 26.0, 28.0, 10.0, 20.0, 26.0, 28.0, 10.0, 28.0]
        );
        let uv = log
            .borrow()
            .iter()
            .find_map(|c| match c {
                GpuCommand::UploadAttribute { location: 1, data, .. } => Some(data.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(uv, vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn flip_swaps_uv_extremes() {
        let (mut g, log) = gfx();
        let tex = white_texture(&mut g, 16, 8);
        g.texture(&tex, Vec2::zero(), DrawParams::default().flip(true, false));
        g.flush();
        let uv = log
            .borrow()
            .iter()
            .find_map(|c| match c {
                GpuCommand::UploadAttribute { location: 1, data, .. } => Some(data.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(&uv[..4], &[1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn trimmed_frame_offsets_corners() {
        let (mut g, log) = gfx();
        let base = white_texture(&mut g, 32, 32);
        let tex = Texture::new(base.image, Rect::new(0.0, 0.0, 4.0, 4.0), Rect::new(-2.0, -3.0, 8.0, 8.0));
        g.texture(&tex, Vec2::zero(), DrawParams::default());
        g.flush();
        assert_eq!(&positions(&log)[..4], &[2.0, 3.0, 6.0, 3.0]);
    }

    #[test]
    fn origin_then_scale_then_rotate() {
        let (mut g, log) = gfx();
        let tex = white_texture(&mut g, 2, 2);
        let params = DrawParams::default()
            .origin(Vec2::new(1.0, 1.0))
            .scale(Vec2::new(2.0, 2.0))
            .rotation(std::f32::consts::FRAC_PI_2);
        g.texture(&tex, Vec2::new(100.0, 100.0), params);
        g.flush();
        let p = positions(&log);
        // TL corner (0,0) -> (-1,-1) -> (-2,-2) -> rotated 90° -> (2,-2)
        assert_abs_diff_eq!(p[0], 102.0, epsilon = 1e-4);
        assert_abs_diff_eq!(p[1], 98.0, epsilon = 1e-4);
    }

    #[test]
    fn circle_emits_three_vertices_per_step() {
        let (mut g, log) = gfx();
        g.circle(Vec2::new(0.0, 0.0), 4.0, 8, Color::white());
        g.flush();
        assert_eq!(draws(&log), vec![24]);
    }

    #[test]
    fn primitives_use_pixel_texture_when_sampling() {
        let (mut g, log) = gfx();
        g.rect(Rect::new(0.0, 0.0, 2.0, 2.0), Color::white());
        g.flush();
        let pixel = g.pixel().image.id;
        assert_eq!(count(&log, |c| *c == GpuCommand::BindTexture { unit: 0, image: pixel }), 1);
    }

    #[test]
    fn primitive_shader_skips_texcoords() {
        let (mut g, log) = gfx();
        let prim = g.primitive_shader();
        g.set_shader(prim);
        g.triangle(Vec2::zero(), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0), Color::white());
        g.flush();
        assert_eq!(count(&log, |c| matches!(c, GpuCommand::UploadAttribute { .. })), 2);
        assert_eq!(count(&log, |c| matches!(c, GpuCommand::BindTexture { .. })), 0);
    }

    #[test]
    fn texture_without_sampler_warns_in_normal_mode() {
        let (mut g, log) = gfx();
        let tex = white_texture(&mut g, 4, 4);
        let prim = g.primitive_shader();
        g.set_shader(prim);
        g.texture(&tex, Vec2::zero(), DrawParams::default());
        g.flush();
        assert_eq!(draws(&log), vec![6]);
    }

    #[test]
    #[should_panic(expected = "no sampler2D")]
    fn texture_without_sampler_panics_in_strict_mode() {
        let (backend, _log) = RecordingBackend::new();
        let config = GraphicsConfig::default().with_assert_mode(AssertMode::Strict);
        let mut g = Graphics::new(Box::new(backend), config).unwrap();
        let tex = white_texture(&mut g, 4, 4);
        let prim = g.primitive_shader();
        g.set_shader(prim);
        g.texture(&tex, Vec2::zero(), DrawParams::default());
    }

    // ── targets and frames ────────────────────────────────────────────────

    #[test]
    fn render_target_switch_flushes_and_sets_viewport() {
        let (mut g, log) = gfx();
        let target = g.create_target(64, 32).unwrap();
        g.rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::white());
        g.set_render_target(Some(&target));
        assert_eq!(draws(&log), vec![6]);
        let tail: Vec<_> = log.borrow().iter().rev().take(2).cloned().collect();
        assert_eq!(tail, vec![GpuCommand::SetViewport(64, 32), GpuCommand::BindTarget(Some(target.id))]);
    }

    #[test]
    fn rebinding_current_target_is_noop() {
        let (mut g, log) = gfx();
        let target = g.create_target(8, 8).unwrap();
        g.set_render_target(Some(&target));
        let before = log.borrow().len();
        g.set_render_target(Some(&target));
        assert_eq!(log.borrow().len(), before);
    }

    #[test]
    fn reset_rebinds_everything_on_next_draw() {
        let (mut g, log) = gfx();
        g.rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::white());
        g.flush();
        g.reset();
        assert_eq!(g.draw_calls(), 0);
        log.borrow_mut().clear();
        g.rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::white());
        assert_eq!(count(&log, |c| matches!(c, GpuCommand::UseProgram(_))), 1);
        // matrix + sampler both re-uploaded after a swap
        assert_eq!(count(&log, |c| matches!(c, GpuCommand::SetUniform { .. })), 2);
    }

    #[test]
    fn reset_binds_and_clears_buffer() {
        let (mut g, log) = gfx();
        g.reset();
        let buffer = g.buffer().id;
        let cmds = log.borrow().clone();
        assert_eq!(cmds[0], GpuCommand::BindTarget(Some(buffer)));
        assert_eq!(cmds[1], GpuCommand::SetViewport(320, 180));
        assert!(matches!(cmds[2], GpuCommand::Clear(_)));
    }

    #[test]
    fn finalize_blits_buffer_to_output_bounds() {
        let (mut g, log) = gfx();
        g.reset();
        g.finalize().unwrap();
        assert_eq!(g.current_target(), None);
        let buffer_image = g.buffer().texture.image.id;
        assert_eq!(count(&log, |c| *c == GpuCommand::BindTexture { unit: 0, image: buffer_image }), 1);
        // 320x180 buffer scaled 4x onto 1280x720 at the origin
        assert_eq!(
            positions(&log),
            vec![0.0, 0.0, 1280.0, 0.0, 1280.0, 720.0, 0.0, 0.0, 1280.0, 720.0, 0.0, 720.0]
        );
    }

    #[test]
    fn screen_to_buffer_inverts_output_bounds() {
        let (g, _) = gfx();
        let p = g.screen_to_buffer(Vec2::new(640.0, 360.0));
        assert_abs_diff_eq!(p.x, 160.0);
        assert_abs_diff_eq!(p.y, 90.0);
    }
}

use anyhow::{Context, Result};

use crate::assets::Assets;
use crate::coords::Viewport;
use crate::core::{App, AppControl, FrameCtx};
use crate::gpu::{GpuBackend, WgpuBackend};
use crate::graphics::Graphics;
use crate::input::Input;
use crate::logging;
use crate::scene::{Scene, Tick};
use crate::time::GameTime;
use crate::window::Runtime;

use super::{EngineConfig, Game, GameCtx};

/// Owns the game, its graphics, assets and the active scene.
///
/// One tick: scene transition, game update, scene update, graphics reset,
/// scene render, buffer finalize, backend end-frame. Input is snapshotted
/// by the caller before the tick.
pub struct Engine<G: Game> {
    config: EngineConfig,
    game: G,
    gfx: Option<Graphics>,
    assets: Assets,
    scene: Option<Scene>,
    next: Option<Scene>,
    exit: bool,
}

impl<G: Game> Engine<G> {
    pub fn new(game: G, config: EngineConfig) -> Self {
        Self {
            config,
            game,
            gfx: None,
            assets: Assets::new(),
            scene: None,
            next: None,
            exit: false,
        }
    }

    /// Opens a window and runs until it closes.
    pub fn run(game: G, config: EngineConfig) -> Result<()> {
        logging::init_logging(&config.logging);
        log::info!("starting `{}`", config.title);
        let runtime = config.runtime_config();
        let gpu_init = config.gpu_init();
        Runtime::run(runtime, gpu_init, Self::new(game, config))
    }

    /// Started engine over an arbitrary backend, driven with [`Engine::tick`].
    pub fn headless(game: G, config: EngineConfig, backend: Box<dyn GpuBackend>) -> Result<Self> {
        let mut engine = Self::new(game, config);
        engine.start(backend)?;
        Ok(engine)
    }

    fn start(&mut self, backend: Box<dyn GpuBackend>) -> Result<()> {
        let mut gfx = Graphics::new(backend, self.config.graphics.clone()).context("failed to create graphics")?;
        let mut scene = self.game.start(&mut gfx, &mut self.assets).context("game failed to start")?;
        scene.begin();
        self.scene = Some(scene);
        self.gfx = Some(gfx);
        log::debug!("engine started");
        Ok(())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    pub fn graphics(&self) -> Option<&Graphics> {
        self.gfx.as_ref()
    }

    pub fn graphics_mut(&mut self) -> Option<&mut Graphics> {
        self.gfx.as_mut()
    }

    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    /// Replaces the active scene at the start of the next tick.
    pub fn goto(&mut self, scene: Scene) {
        self.next = Some(scene);
    }

    #[inline]
    pub fn exit_requested(&self) -> bool {
        self.exit
    }

    fn transition(&mut self) {
        let Some(mut next) = self.next.take() else { return };
        if let Some(mut old) = self.scene.take() {
            old.ended();
            old.dispose();
        }
        next.begin();
        self.scene = Some(next);
    }

    /// Updates and draws one frame into the backend without ending it.
    pub fn step(&mut self, time: GameTime, input: &Input) -> Result<()> {
        self.transition();

        let (Some(gfx), Some(scene)) = (self.gfx.as_mut(), self.scene.as_mut()) else {
            return Ok(());
        };

        let mut ctx = GameCtx {
            scene: &mut *scene,
            gfx: &mut *gfx,
            assets: &mut self.assets,
            input,
            time,
            next: &mut self.next,
            exit: &mut self.exit,
        };
        self.game.update(&mut ctx).context("game update failed")?;

        scene.update(&Tick { time, input }).context("scene update failed")?;

        gfx.reset();
        scene.render(gfx).context("scene render failed")?;
        gfx.finalize().context("finalize failed")?;
        Ok(())
    }

    /// [`Engine::step`] followed by the backend's end of frame.
    pub fn tick(&mut self, time: GameTime, input: &Input) -> Result<()> {
        self.step(time, input)?;
        if let Some(gfx) = self.gfx.as_mut() {
            gfx.end_frame();
        }
        Ok(())
    }
}

impl<G: Game> App for Engine<G> {
    fn on_resize(&mut self, size: Viewport) {
        if let Some(gfx) = self.gfx.as_mut() {
            gfx.resize(size);
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.gfx.is_none() {
            let backend = ctx.gpu.create_backend();
            if let Err(err) = self.start(Box::new(backend)) {
                log::error!("{err:#}");
                return AppControl::Exit;
            }
        }

        if let Err(err) = self.step(ctx.time, ctx.input) {
            log::error!("{err:#}");
            return AppControl::Exit;
        }

        let Some(gfx) = self.gfx.as_mut() else {
            return AppControl::Exit;
        };
        let control = ctx.present(|encoder, view| {
            match gfx.backend_mut().as_any_mut().downcast_mut::<WgpuBackend>() {
                Some(wgpu) => wgpu.present(encoder, view),
                None => log::warn!("frame presented without a wgpu backend"),
            }
        });
        gfx.end_frame();

        if self.exit { AppControl::Exit } else { control }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Rectsprite;
    use crate::coords::Vec2;
    use crate::gpu::{CommandLog, GpuCommand, RecordingBackend};
    use crate::input::{ButtonState, InputEvent, Key};
    use crate::paint::Color;
    use crate::render::EverythingRenderer;
    use crate::scene::Entity;

    #[derive(Default)]
    struct Boxes {
        starts: u32,
        updates: u32,
    }

    fn scene_with(count: usize) -> Scene {
        let mut scene = Scene::new();
        scene.add_renderer(EverythingRenderer::new());
        for i in 0..count {
            let rect = Rectsprite::new(4.0, 4.0, Color::white());
            scene.add(Entity::at(Vec2::new(i as f32 * 8.0, 0.0)).with(rect).unwrap(), None).unwrap();
        }
        scene
    }

    impl Game for Boxes {
        fn start(&mut self, _gfx: &mut Graphics, _assets: &mut Assets) -> anyhow::Result<Scene> {
            self.starts += 1;
            Ok(scene_with(2))
        }

        fn update(&mut self, ctx: &mut GameCtx<'_>) -> anyhow::Result<()> {
            self.updates += 1;
            if ctx.input.pressed(Key::Enter) {
                ctx.goto(scene_with(5));
            }
            if ctx.input.pressed(Key::Escape) {
                ctx.exit();
            }
            Ok(())
        }
    }

    fn engine() -> (Engine<Boxes>, CommandLog) {
        let (backend, log) = RecordingBackend::new();
        let engine = Engine::headless(Boxes::default(), EngineConfig::default(), Box::new(backend)).unwrap();
        (engine, log)
    }

    fn dt() -> GameTime {
        GameTime::from_delta(1.0 / 60.0)
    }

    fn press(key: Key) -> Input {
        let mut input = Input::new();
        input.apply(InputEvent::Key { key, state: ButtonState::Pressed, repeat: false });
        input
    }

    #[test]
    fn headless_start_begins_first_scene() {
        let (engine, _) = engine();
        assert_eq!(engine.game().starts, 1);
        let scene = engine.scene().unwrap();
        assert!(scene.is_started());
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn tick_clears_draws_and_ends_frame() {
        let (mut engine, log) = engine();
        log.borrow_mut().clear();
        engine.tick(dt(), &Input::new()).unwrap();

        let commands = log.borrow();
        let clear = engine.config().graphics.clear_color;
        assert!(commands.contains(&GpuCommand::Clear(clear)));
        // Both rects in one batch, then the buffer blit.
        assert!(commands.contains(&GpuCommand::DrawTriangles(12)));
        assert!(commands.contains(&GpuCommand::DrawTriangles(6)));
        assert_eq!(commands.last(), Some(&GpuCommand::EndFrame));
        assert_eq!(engine.game().updates, 1);
    }

    #[test]
    fn goto_switches_on_next_tick() {
        let (mut engine, _) = engine();
        engine.tick(dt(), &press(Key::Enter)).unwrap();
        assert_eq!(engine.scene().unwrap().len(), 2);

        engine.tick(dt(), &Input::new()).unwrap();
        let scene = engine.scene().unwrap();
        assert_eq!(scene.len(), 5);
        assert!(scene.is_started());
    }

    #[test]
    fn goto_from_outside_applies_before_update() {
        let (mut engine, _) = engine();
        engine.goto(scene_with(3));
        engine.tick(dt(), &Input::new()).unwrap();
        assert_eq!(engine.scene().unwrap().len(), 3);
    }

    #[test]
    fn game_can_request_exit() {
        let (mut engine, _) = engine();
        assert!(!engine.exit_requested());
        engine.tick(dt(), &press(Key::Escape)).unwrap();
        assert!(engine.exit_requested());
    }

    #[test]
    fn failing_start_is_reported() {
        struct Broken;
        impl Game for Broken {
            fn start(&mut self, _gfx: &mut Graphics, _assets: &mut Assets) -> anyhow::Result<Scene> {
                anyhow::bail!("missing level")
            }
        }
        let (backend, _) = RecordingBackend::new();
        let err = Engine::headless(Broken, EngineConfig::default(), Box::new(backend)).err().unwrap();
        assert!(format!("{err:#}").contains("missing level"));
    }
}

use crate::assets::Assets;
use crate::graphics::Graphics;
use crate::input::Input;
use crate::scene::Scene;
use crate::time::GameTime;

/// Game-level hooks around the engine loop.
pub trait Game: 'static {
    /// Loads assets and builds the first scene. Called once graphics exist.
    fn start(&mut self, gfx: &mut Graphics, assets: &mut Assets) -> anyhow::Result<Scene>;

    /// Runs every tick before the scene updates.
    fn update(&mut self, ctx: &mut GameCtx<'_>) -> anyhow::Result<()> {
        let _ = ctx;
        Ok(())
    }
}

/// What [`Game::update`] can reach.
pub struct GameCtx<'a> {
    pub scene: &'a mut Scene,
    pub gfx: &'a mut Graphics,
    pub assets: &'a mut Assets,
    pub input: &'a Input,
    pub time: GameTime,
    pub(super) next: &'a mut Option<Scene>,
    pub(super) exit: &'a mut bool,
}

impl GameCtx<'_> {
    /// Switches to `scene` at the start of the next tick.
    pub fn goto(&mut self, scene: Scene) {
        *self.next = Some(scene);
    }

    pub fn exit(&mut self) {
        *self.exit = true;
    }
}

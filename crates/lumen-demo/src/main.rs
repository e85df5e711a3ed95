use anyhow::Context;

use lumen_engine::assets::{Assets, Texture};
use lumen_engine::collision::Collider;
use lumen_engine::components::{Physics, Rectsprite, Tilemap};
use lumen_engine::coords::Vec2;
use lumen_engine::graphics::Graphics;
use lumen_engine::input::Key;
use lumen_engine::paint::Color;
use lumen_engine::render::EverythingRenderer;
use lumen_engine::scene::{Component, ComponentHandle, ComponentState, Entity, EntityId, Scene, UpdateCtx};
use lumen_engine::{Engine, EngineConfig, Game, GameCtx};

const TILE: f32 = 8.0;
const COLUMNS: usize = 80;
const ROWS: usize = 23;

const RUN_SPEED: f32 = 90.0;
const GRAVITY: f32 = 600.0;
const MAX_FALL: f32 = 240.0;
const JUMP_SPEED: f32 = 220.0;

/// Arrow keys run, space jumps.
struct Player {
    physics: Physics,
    velocity: Vec2,
}

impl Player {
    fn new() -> Self {
        Self {
            physics: Physics::new(-4.0, -8.0, 8.0, 8.0).with_solids(["solid"]),
            velocity: Vec2::zero(),
        }
    }

    fn on_ground(&self, state: &ComponentState, ctx: &UpdateCtx<'_>) -> bool {
        let below = *ctx.position + state.position + Vec2::new(0.0, 1.0);
        matches!(ctx.scene.collide(&self.physics.collider, below, "solid"), Ok(Some(_)))
    }
}

impl Component for Player {
    fn update(&mut self, state: &mut ComponentState, ctx: &mut UpdateCtx<'_>) {
        let dt = ctx.delta();
        let grounded = self.on_ground(state, ctx);

        self.velocity.x = ctx.input.axis(Key::ArrowLeft, Key::ArrowRight) * RUN_SPEED;
        self.velocity.y = (self.velocity.y + GRAVITY * dt).min(MAX_FALL);
        if grounded && ctx.input.pressed(Key::Space) {
            self.velocity.y = -JUMP_SPEED;
        }

        let moved = self
            .physics
            .move_x(self.velocity.x * dt, state, ctx)
            .and_then(|_| self.physics.move_y(self.velocity.y * dt, state, ctx));
        match moved {
            Ok(true) => {}
            Ok(false) => self.velocity.y = 0.0,
            Err(err) => ctx.commands.fail(err),
        }
    }

    fn collider(&self) -> Option<&Collider> {
        Some(&self.physics.collider)
    }

    fn collider_mut(&mut self) -> Option<&mut Collider> {
        Some(&mut self.physics.collider)
    }
}

#[derive(Default)]
struct Demo {
    player: Option<(EntityId, ComponentHandle<Player>)>,
    coins: u32,
}

impl Demo {
    fn tileset(gfx: &mut Graphics) -> anyhow::Result<Texture> {
        let (w, h) = (16_u32, 8_u32);
        let mut rgba = Vec::with_capacity((w * h * 4) as usize);
        for _y in 0..h {
            for x in 0..w {
                let edge = x % 8 == 0;
                let pixel = match (x < 8, edge) {
                    (true, false) => [92, 74, 58, 255],
                    (true, true) => [70, 56, 44, 255],
                    (false, _) => [58, 130, 74, 255],
                };
                rgba.extend_from_slice(&pixel);
            }
        }
        Ok(gfx.create_texture(w, h, Some(&rgba))?)
    }

    fn level(&mut self, gfx: &mut Graphics) -> anyhow::Result<Scene> {
        let mut scene = Scene::new();
        scene.add_renderer(EverythingRenderer::new().with_clear(Color::from_hex(0x1d2b53)));

        // Ground, a ledge and the two walls share one grid.
        let mut grid = Collider::hitgrid(TILE, TILE).tagged("solid");
        let mut map = Tilemap::new(TILE, TILE, COLUMNS, ROWS).with_tileset(&Self::tileset(gfx)?);
        let mut solid = |tx: usize, ty: usize, columns: usize, rows: usize| {
            if let Some(cells) = grid.as_hitgrid_mut() {
                cells.set(true, tx as i32, ty as i32, columns as u32, rows as u32);
            }
            map.fill(Some(0), tx, ty, columns, rows);
            map.fill(Some(1), tx, ty, columns, 1);
        };
        solid(0, 20, COLUMNS, 3);
        solid(0, 0, 1, 20);
        solid(COLUMNS - 1, 0, 1, 20);
        solid(14, 15, 8, 1);
        solid(30, 12, 6, 1);

        scene.add(Entity::new().with_depth(10).with(map)?.with(grid)?, None)?;

        for (i, x) in [40.0, 136.0, 264.0, 400.0].into_iter().enumerate() {
            let y = if i % 2 == 0 { 140.0 } else { 100.0 };
            let coin = Entity::at(Vec2::new(x, y))
                .in_group("coins")
                .with(Rectsprite::new(4.0, 4.0, Color::from_hex(0xffec27)).centered())?
                .with(Collider::hitbox(-2.0, -2.0, 4.0, 4.0).tagged("coin"))?;
            scene.add(coin, None)?;
        }

        let mut player = Entity::at(Vec2::new(24.0, 150.0)).with_depth(-10);
        let handle = player.add(Player::new())?;
        player.add_at(Rectsprite::new(8.0, 8.0, Color::from_hex(0xff004d)), Vec2::new(-4.0, -8.0))?;
        let id = scene.add(player, None)?;
        self.player = Some((id, handle));

        Ok(scene)
    }
}

impl Game for Demo {
    fn start(&mut self, gfx: &mut Graphics, _assets: &mut Assets) -> anyhow::Result<Scene> {
        self.level(gfx)
    }

    fn update(&mut self, ctx: &mut GameCtx<'_>) -> anyhow::Result<()> {
        if ctx.input.pressed(Key::Escape) {
            ctx.exit();
            return Ok(());
        }
        if ctx.input.pressed(Key::R) {
            let scene = self.level(ctx.gfx)?;
            ctx.goto(scene);
            return Ok(());
        }

        let Some((id, handle)) = self.player else { return Ok(()) };
        let Some(entity) = ctx.scene.get(id) else { return Ok(()) };
        let position = entity.position;

        let hits = match entity.get(handle) {
            Some(player) => ctx.scene.collide_all(&player.physics.collider, position, "coin")?,
            None => Vec::new(),
        };
        for hit in hits {
            ctx.scene.destroy(hit.entity)?;
            self.coins += 1;
            log::info!("coins: {}", self.coins);
        }

        if let Some(renderer) = ctx.scene.renderer_mut::<EverythingRenderer>() {
            let camera = renderer.camera_mut();
            let half = camera.viewport().width / 2.0;
            let max = COLUMNS as f32 * TILE - camera.viewport().width;
            camera.position.x = (position.x - half).clamp(0.0, max).round();
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(&path).with_context(|| format!("failed to read config `{path}`"))?,
        None => EngineConfig::default().with_title("lumen demo"),
    };
    Engine::run(Demo::default(), config)
}

use std::fmt;

use crate::collision::Collider;
use crate::coords::Vec2;
use crate::error::Result;
use crate::scene::{ColliderRef, Component, ComponentState, UpdateCtx};

type CollideFn = Box<dyn FnMut(ColliderRef)>;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Axis {
    X,
    Y,
}

/// Hitbox that moves its entity in whole pixels.
///
/// Fractional motion accumulates in `remainder` across frames. With `solids`
/// set, movement advances one pixel at a time and stops just short of the
/// first collider carrying any of those tags.
pub struct Physics {
    pub collider: Collider,
    /// Pixels per second, applied in `update`.
    pub speed: Vec2,
    pub remainder: Vec2,
    pub solids: Vec<String>,
    on_collide_x: Option<CollideFn>,
    on_collide_y: Option<CollideFn>,
}

impl Physics {
    /// Mover with a `width × height` hitbox at (`left`, `top`) from the entity.
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            collider: Collider::hitbox(left, top, width, height),
            speed: Vec2::zero(),
            remainder: Vec2::zero(),
            solids: Vec::new(),
            on_collide_x: None,
            on_collide_y: None,
        }
    }

    pub fn with_solids<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.solids.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_speed(mut self, speed: Vec2) -> Self {
        self.speed = speed;
        self
    }

    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.collider.tag(tag);
        self
    }

    /// Called with the blocking collider when horizontal movement stops.
    pub fn on_collide_x(mut self, f: impl FnMut(ColliderRef) + 'static) -> Self {
        self.on_collide_x = Some(Box::new(f));
        self
    }

    /// Called with the blocking collider when vertical movement stops.
    pub fn on_collide_y(mut self, f: impl FnMut(ColliderRef) + 'static) -> Self {
        self.on_collide_y = Some(Box::new(f));
        self
    }

    /// Moves horizontally by `amount` pixels plus the stored remainder.
    ///
    /// Returns `false` if a solid stopped the motion.
    pub fn move_x(&mut self, amount: f32, state: &ComponentState, ctx: &mut UpdateCtx<'_>) -> Result<bool> {
        self.remainder.x += amount;
        let step = self.remainder.x.trunc();
        self.remainder.x -= step;
        self.move_pixels(step as i32, Axis::X, state, ctx)
    }

    /// Moves vertically by `amount` pixels plus the stored remainder.
    pub fn move_y(&mut self, amount: f32, state: &ComponentState, ctx: &mut UpdateCtx<'_>) -> Result<bool> {
        self.remainder.y += amount;
        let step = self.remainder.y.trunc();
        self.remainder.y -= step;
        self.move_pixels(step as i32, Axis::Y, state, ctx)
    }

    /// Horizontal then vertical. Returns `false` if either axis was blocked.
    pub fn move_by(&mut self, by: Vec2, state: &ComponentState, ctx: &mut UpdateCtx<'_>) -> Result<bool> {
        let x = self.move_x(by.x, state, ctx)?;
        let y = self.move_y(by.y, state, ctx)?;
        Ok(x && y)
    }

    fn move_pixels(&mut self, pixels: i32, axis: Axis, state: &ComponentState, ctx: &mut UpdateCtx<'_>) -> Result<bool> {
        let unit = match axis {
            Axis::X => Vec2::new(pixels.signum() as f32, 0.0),
            Axis::Y => Vec2::new(0.0, pixels.signum() as f32),
        };

        if self.solids.is_empty() {
            *ctx.position += unit * pixels.abs() as f32;
            return Ok(true);
        }

        for _ in 0..pixels.abs() {
            let next = *ctx.position + state.position + unit;
            if let Some(hit) = self.first_solid(ctx, next)? {
                let callback = match axis {
                    Axis::X => {
                        self.remainder.x = 0.0;
                        self.on_collide_x.as_mut()
                    }
                    Axis::Y => {
                        self.remainder.y = 0.0;
                        self.on_collide_y.as_mut()
                    }
                };
                if let Some(callback) = callback {
                    callback(hit);
                }
                return Ok(false);
            }
            *ctx.position += unit;
        }
        Ok(true)
    }

    fn first_solid(&self, ctx: &UpdateCtx<'_>, at: Vec2) -> Result<Option<ColliderRef>> {
        for tag in &self.solids {
            if let Some(hit) = ctx.scene.collide(&self.collider, at, tag)? {
                return Ok(Some(hit));
            }
        }
        Ok(None)
    }
}

impl Component for Physics {
    fn update(&mut self, state: &mut ComponentState, ctx: &mut UpdateCtx<'_>) {
        let dt = ctx.delta();
        let motion = self.speed * dt;
        if let Err(err) = self.move_by(motion, state, ctx) {
            ctx.commands.fail(err);
        }
    }

    fn collider(&self) -> Option<&Collider> {
        Some(&self.collider)
    }

    fn collider_mut(&mut self) -> Option<&mut Collider> {
        Some(&mut self.collider)
    }
}

impl fmt::Debug for Physics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Physics")
            .field("collider", &self.collider)
            .field("speed", &self.speed)
            .field("remainder", &self.remainder)
            .field("solids", &self.solids)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::collision::{ColliderType, Shape};
    use crate::coords::Rect;
    use crate::error::EngineError;
    use crate::input::Input;
    use crate::scene::{Commands, Entity, EntityId, Scene, Tick};
    use crate::time::GameTime;

    fn run<R>(scene: &Scene, position: &mut Vec2, f: impl FnOnce(&mut UpdateCtx<'_>) -> R) -> R {
        let input = Input::default();
        let mut commands = Commands::new();
        let mut ctx = UpdateCtx {
            scene,
            entity: EntityId::default(),
            position,
            time: GameTime::from_delta(0.0),
            input: &input,
            commands: &mut commands,
        };
        f(&mut ctx)
    }

    fn wall_at(scene: &mut Scene, x: f32) -> EntityId {
        let wall = Entity::at(Vec2::new(x, 0.0)).with(Collider::hitbox(0.0, 0.0, 10.0, 10.0).tagged("solid"));
        scene.add(wall.unwrap(), None).unwrap()
    }

    // ── remainder ─────────────────────────────────────────────────────────

    #[test]
    fn fractions_accumulate_across_calls() {
        let scene = Scene::new();
        let state = ComponentState::default();
        let mut body = Physics::new(0.0, 0.0, 1.0, 1.0);
        let mut pos = Vec2::zero();

        for _ in 0..3 {
            run(&scene, &mut pos, |ctx| body.move_x(0.4, &state, ctx).unwrap());
        }
        assert_eq!(pos.x, 1.0);
        assert_abs_diff_eq!(body.remainder.x, 0.2, epsilon = 1e-5);
    }

    #[test]
    fn negative_motion_truncates_toward_zero() {
        let scene = Scene::new();
        let state = ComponentState::default();
        let mut body = Physics::new(0.0, 0.0, 1.0, 1.0);
        let mut pos = Vec2::zero();

        assert!(run(&scene, &mut pos, |ctx| body.move_y(-2.5, &state, ctx).unwrap()));
        assert_eq!(pos.y, -2.0);
        assert_abs_diff_eq!(body.remainder.y, -0.5, epsilon = 1e-6);
    }

    // ── solids ────────────────────────────────────────────────────────────

    #[test]
    fn stops_one_pixel_short_of_solid() {
        let mut scene = Scene::new();
        let wall = wall_at(&mut scene, 5.0);

        let hits = Rc::new(Cell::new(0));
        let seen = hits.clone();
        let mut mover = Entity::new();
        let body = mover
            .add(
                Physics::new(0.0, 0.0, 1.0, 1.0)
                    .with_solids(["solid"])
                    .with_speed(Vec2::new(300.0, 0.0))
                    .on_collide_x(move |hit| {
                        assert_eq!(hit.entity, wall);
                        seen.set(seen.get() + 1);
                    }),
            )
            .unwrap();
        let id = scene.add(mover, None).unwrap();

        let input = Input::default();
        scene.update(&Tick { time: GameTime::from_delta(0.1), input: &input }).unwrap();

        assert_eq!(scene.get(id).unwrap().position, Vec2::new(4.0, 0.0));
        assert_eq!(hits.get(), 1);
        assert_eq!(scene.component(id, body).unwrap().remainder.x, 0.0);
    }

    #[test]
    fn unblocked_motion_covers_full_distance() {
        let mut scene = Scene::new();
        wall_at(&mut scene, 100.0);
        let state = ComponentState::default();
        let mut body = Physics::new(0.0, 0.0, 1.0, 1.0).with_solids(["solid"]);
        let mut pos = Vec2::zero();

        assert!(run(&scene, &mut pos, |ctx| body.move_x(20.0, &state, ctx).unwrap()));
        assert_eq!(pos.x, 20.0);
    }

    #[test]
    fn local_offset_shifts_the_hitbox() {
        let mut scene = Scene::new();
        wall_at(&mut scene, 5.0);
        let state = ComponentState::at(Vec2::new(2.0, 0.0));
        let mut body = Physics::new(0.0, 0.0, 1.0, 1.0).with_solids(["solid"]);
        let mut pos = Vec2::zero();

        assert!(!run(&scene, &mut pos, |ctx| body.move_x(10.0, &state, ctx).unwrap()));
        assert_eq!(pos.x, 2.0);
    }

    #[test]
    fn vertical_block_fires_y_callback_only() {
        let mut scene = Scene::new();
        let floor = Entity::at(Vec2::new(0.0, 8.0)).with(Collider::hitbox(0.0, 0.0, 10.0, 10.0).tagged("solid"));
        scene.add(floor.unwrap(), None).unwrap();

        let (xs, ys) = (Rc::new(Cell::new(0)), Rc::new(Cell::new(0)));
        let (x2, y2) = (xs.clone(), ys.clone());
        let state = ComponentState::default();
        let mut body = Physics::new(0.0, 0.0, 2.0, 2.0)
            .with_solids(["solid"])
            .on_collide_x(move |_| x2.set(x2.get() + 1))
            .on_collide_y(move |_| y2.set(y2.get() + 1));
        let mut pos = Vec2::zero();

        let moved = run(&scene, &mut pos, |ctx| body.move_by(Vec2::new(3.0, 20.0), &state, ctx).unwrap());
        assert!(!moved);
        assert_eq!(pos, Vec2::new(3.0, 6.0));
        assert_eq!((xs.get(), ys.get()), (0, 1));
    }

    // ── errors ────────────────────────────────────────────────────────────

    struct Blob;

    impl Shape for Blob {
        fn kind(&self) -> ColliderType {
            ColliderType("blob")
        }

        fn local_bounds(&self) -> Rect {
            Rect::new(0.0, 0.0, 4.0, 4.0)
        }
    }

    #[test]
    fn unregistered_solid_pair_fails_the_update() {
        let mut scene = Scene::new();
        let blob = Entity::at(Vec2::new(8.0, 0.0)).with(Collider::new(Blob).tagged("solid"));
        scene.add(blob.unwrap(), None).unwrap();

        let mover = Entity::new()
            .with(Physics::new(0.0, 0.0, 1.0, 1.0).with_solids(["solid"]).with_speed(Vec2::new(30.0, 0.0)))
            .unwrap();
        scene.add(mover, None).unwrap();

        let input = Input::default();
        let err = scene.update(&Tick { time: GameTime::from_delta(0.1), input: &input }).unwrap_err();
        assert!(matches!(err, EngineError::UnregisteredOverlap { .. }), "{err}");
    }
}

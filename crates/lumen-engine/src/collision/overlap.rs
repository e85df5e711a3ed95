use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::coords::{Rect, Vec2};
use crate::error::{EngineError, Result};

use super::{Collider, ColliderType, Hitbox, Hitgrid, Shape};

/// Overlap test between two shapes placed at the given scene positions.
pub type OverlapTest = Rc<dyn Fn(&dyn Shape, Vec2, &dyn Shape, Vec2) -> bool>;

/// Dispatch table of overlap tests keyed by the ordered pair of shape kinds.
///
/// Registering `(a, b)` also registers `(b, a)` with the arguments swapped,
/// so `overlap(x, y) == overlap(y, x)` for every registered pair.
#[derive(Clone, Default)]
pub struct OverlapRegistry {
    tests: HashMap<(ColliderType, ColliderType), OverlapTest>,
}

impl OverlapRegistry {
    /// Empty registry. Every pair the game tests must be registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the hitbox/hitbox and hitbox/hitgrid tests.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(ColliderType::HITBOX, ColliderType::HITBOX, hitbox_hitbox);
        registry.register(ColliderType::HITBOX, ColliderType::HITGRID, hitbox_hitgrid);
        registry
    }

    /// Registers `test` for `(a, b)` and its mirror for `(b, a)`. Replaces earlier entries.
    pub fn register<F>(&mut self, a: ColliderType, b: ColliderType, test: F)
    where
        F: Fn(&dyn Shape, Vec2, &dyn Shape, Vec2) -> bool + 'static,
    {
        let test: OverlapTest = Rc::new(test);
        if a != b {
            let forward = Rc::clone(&test);
            let mirrored: OverlapTest =
                Rc::new(move |x: &dyn Shape, at_x: Vec2, y: &dyn Shape, at_y: Vec2| forward(y, at_y, x, at_x));
            self.tests.insert((b, a), mirrored);
        }
        self.tests.insert((a, b), test);
        log::debug!("overlap test registered: {a} <-> {b}");
    }

    #[inline]
    pub fn is_registered(&self, a: ColliderType, b: ColliderType) -> bool {
        self.tests.contains_key(&(a, b))
    }

    /// Tests `a` at `at_a` against `b` at `at_b`.
    ///
    /// A pair with no registered test is an integration bug and reported as
    /// [`EngineError::UnregisteredOverlap`] instead of a silent miss.
    pub fn overlap(&self, a: &dyn Shape, at_a: Vec2, b: &dyn Shape, at_b: Vec2) -> Result<bool> {
        let (ka, kb) = (a.kind(), b.kind());
        let test = self
            .tests
            .get(&(ka, kb))
            .ok_or(EngineError::UnregisteredOverlap { a: ka.name(), b: kb.name() })?;
        Ok(test(a, at_a, b, at_b))
    }

    #[inline]
    pub fn overlap_colliders(&self, a: &Collider, at_a: Vec2, b: &Collider, at_b: Vec2) -> Result<bool> {
        self.overlap(a.shape(), at_a, b.shape(), at_b)
    }
}

impl fmt::Debug for OverlapRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.tests.keys()).finish()
    }
}

#[inline]
fn placed(rect: Rect, at: Vec2) -> Rect {
    Rect::new(rect.x + at.x, rect.y + at.y, rect.width, rect.height)
}

fn hitbox_hitbox(a: &dyn Shape, at_a: Vec2, b: &dyn Shape, at_b: Vec2) -> bool {
    let (Some(a), Some(b)) = (a.as_any().downcast_ref::<Hitbox>(), b.as_any().downcast_ref::<Hitbox>()) else {
        return false;
    };
    placed(a.rect(), at_a).overlaps(placed(b.rect(), at_b))
}

fn hitbox_hitgrid(a: &dyn Shape, at_a: Vec2, b: &dyn Shape, at_b: Vec2) -> bool {
    let (Some(hitbox), Some(grid)) = (a.as_any().downcast_ref::<Hitbox>(), b.as_any().downcast_ref::<Hitgrid>())
    else {
        return false;
    };
    let tile = grid.tile_size();
    if tile.x <= 0.0 || tile.y <= 0.0 {
        return false;
    }

    let r = placed(hitbox.rect(), at_a);
    let x0 = ((r.left() - at_b.x) / tile.x).floor() as i32;
    let y0 = ((r.top() - at_b.y) / tile.y).floor() as i32;
    let x1 = ((r.right() - at_b.x) / tile.x).ceil() as i32;
    let y1 = ((r.bottom() - at_b.y) / tile.y).ceil() as i32;
    grid.any_in(x0, y0, x1, y1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    fn boxed(x: f32, y: f32, w: f32, h: f32) -> Hitbox {
        Hitbox::new(x, y, w, h)
    }

    /// Point-like shape used to exercise custom registrations.
    struct Dot;

    const DOT: ColliderType = ColliderType("dot");

    impl Shape for Dot {
        fn kind(&self) -> ColliderType {
            DOT
        }

        fn local_bounds(&self) -> Rect {
            Rect::new(0.0, 0.0, 0.0, 0.0)
        }
    }

    // ── hitbox ↔ hitbox ───────────────────────────────────────────────────

    #[test]
    fn overlapping_boxes_hit() {
        let reg = OverlapRegistry::with_builtins();
        let hit = reg.overlap(&boxed(0.0, 0.0, 10.0, 10.0), ORIGIN, &boxed(5.0, 5.0, 10.0, 10.0), ORIGIN);
        assert!(hit.unwrap());
    }

    #[test]
    fn touching_boxes_miss() {
        let reg = OverlapRegistry::with_builtins();
        let hit = reg.overlap(&boxed(0.0, 0.0, 10.0, 10.0), ORIGIN, &boxed(10.0, 0.0, 10.0, 10.0), ORIGIN);
        assert!(!hit.unwrap());
    }

    #[test]
    fn positions_offset_local_boxes() {
        let reg = OverlapRegistry::with_builtins();
        let a = boxed(0.0, 0.0, 4.0, 4.0);
        assert!(!reg.overlap(&a, ORIGIN, &a, Vec2::new(4.0, 0.0)).unwrap());
        assert!(reg.overlap(&a, ORIGIN, &a, Vec2::new(3.5, 3.5)).unwrap());
    }

    // ── hitbox ↔ hitgrid ──────────────────────────────────────────────────

    #[test]
    fn box_hits_solid_cell() {
        let reg = OverlapRegistry::with_builtins();
        let mut grid = Hitgrid::new(8.0, 8.0);
        grid.set(true, 2, 0, 1, 1);

        let mover = boxed(0.0, 0.0, 4.0, 4.0);
        assert!(!reg.overlap(&mover, Vec2::new(12.0, 0.0), &grid, ORIGIN).unwrap());
        assert!(reg.overlap(&mover, Vec2::new(13.0, 0.0), &grid, ORIGIN).unwrap());
        assert!(!reg.overlap(&mover, Vec2::new(24.0, 0.0), &grid, ORIGIN).unwrap());
    }

    #[test]
    fn grid_origin_shifts_cells() {
        let reg = OverlapRegistry::with_builtins();
        let mut grid = Hitgrid::new(8.0, 8.0);
        grid.set(true, 0, 0, 1, 1);

        let mover = boxed(0.0, 0.0, 2.0, 2.0);
        assert!(!reg.overlap(&mover, ORIGIN, &grid, Vec2::new(100.0, 0.0)).unwrap());
        assert!(reg.overlap(&mover, Vec2::new(101.0, 1.0), &grid, Vec2::new(100.0, 0.0)).unwrap());
    }

    // ── symmetry / dispatch ───────────────────────────────────────────────

    #[test]
    fn builtin_pairs_are_symmetric() {
        let reg = OverlapRegistry::with_builtins();
        let mut grid = Hitgrid::new(4.0, 4.0);
        grid.set(true, 1, 1, 2, 2);

        for &(x, y) in &[(0.0, 0.0), (3.0, 3.0), (7.9, 7.9), (12.0, 4.0), (-2.0, 5.0)] {
            let mover = boxed(0.0, 0.0, 2.0, 2.0);
            let at = Vec2::new(x, y);
            assert_eq!(
                reg.overlap(&mover, at, &grid, ORIGIN).unwrap(),
                reg.overlap(&grid, ORIGIN, &mover, at).unwrap(),
                "asymmetric at {at:?}",
            );
        }
    }

    #[test]
    fn custom_registration_is_mirrored() {
        let mut reg = OverlapRegistry::with_builtins();
        reg.register(DOT, ColliderType::HITBOX, |dot, at_dot, other, at_other| {
            assert_eq!(dot.kind(), DOT);
            placed(other.local_bounds(), at_other).contains(at_dot)
        });

        let target = boxed(0.0, 0.0, 10.0, 10.0);
        for &(x, y) in &[(1.0, 1.0), (10.0, 5.0), (-1.0, 0.0)] {
            let at = Vec2::new(x, y);
            assert_eq!(
                reg.overlap(&Dot, at, &target, ORIGIN).unwrap(),
                reg.overlap(&target, ORIGIN, &Dot, at).unwrap(),
            );
        }
        assert!(reg.overlap(&target, ORIGIN, &Dot, Vec2::new(1.0, 1.0)).unwrap());
    }

    #[test]
    fn unregistered_pair_is_an_error() {
        let reg = OverlapRegistry::with_builtins();
        let err = reg.overlap(&Dot, ORIGIN, &boxed(0.0, 0.0, 1.0, 1.0), ORIGIN).unwrap_err();
        assert!(matches!(err, EngineError::UnregisteredOverlap { a: "dot", b: "hitbox" }));
    }

    #[test]
    fn empty_registry_rejects_builtins() {
        let reg = OverlapRegistry::new();
        assert!(!reg.is_registered(ColliderType::HITBOX, ColliderType::HITBOX));
        assert!(reg.overlap(&boxed(0.0, 0.0, 1.0, 1.0), ORIGIN, &boxed(0.0, 0.0, 1.0, 1.0), ORIGIN).is_err());
    }
}

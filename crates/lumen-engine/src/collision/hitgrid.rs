use std::collections::HashSet;

use crate::coords::{Rect, Vec2};
use crate::graphics::Graphics;
use crate::paint::Color;

use super::{ColliderType, Shape};

/// Sparse grid of solid cells at a fixed tile size.
///
/// Cell `(tx, ty)` covers `[tx * tile_width, (tx + 1) * tile_width)` on x and
/// the matching range on y, relative to the grid's origin. Negative indices
/// are allowed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hitgrid {
    tile_width: f32,
    tile_height: f32,
    cells: HashSet<(i32, i32)>,
}

impl Hitgrid {
    pub fn new(tile_width: f32, tile_height: f32) -> Self {
        Self { tile_width, tile_height, cells: HashSet::new() }
    }

    #[inline]
    pub fn tile_size(&self) -> Vec2 {
        Vec2::new(self.tile_width, self.tile_height)
    }

    /// Marks (or clears) the `columns × rows` block starting at `(tx, ty)`.
    pub fn set(&mut self, solid: bool, tx: i32, ty: i32, columns: u32, rows: u32) {
        for y in ty..ty + rows as i32 {
            for x in tx..tx + columns as i32 {
                if solid {
                    self.cells.insert((x, y));
                } else {
                    self.cells.remove(&(x, y));
                }
            }
        }
    }

    #[inline]
    pub fn has(&self, tx: i32, ty: i32) -> bool {
        self.cells.contains(&(tx, ty))
    }

    /// Number of solid cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Whether any solid cell index lies in `[x0, x1) × [y0, y1)`.
    ///
    /// The range is first clamped to the occupied cells. When it still spans
    /// more indices than there are solid cells, the cells are scanned instead.
    pub fn any_in(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> bool {
        let Some((min_x, min_y, max_x, max_y)) = self.occupied() else {
            return false;
        };
        let (x0, y0) = (x0.max(min_x), y0.max(min_y));
        let (x1, y1) = (x1.min(max_x.saturating_add(1)), y1.min(max_y.saturating_add(1)));
        if x0 >= x1 || y0 >= y1 {
            return false;
        }

        let span = (i64::from(x1) - i64::from(x0)) * (i64::from(y1) - i64::from(y0));
        if span > self.cells.len() as i64 {
            return self.cells.iter().any(|&(x, y)| x >= x0 && x < x1 && y >= y0 && y < y1);
        }
        (y0..y1).any(|y| (x0..x1).any(|x| self.has(x, y)))
    }

    /// Inclusive index bounds of the solid cells.
    fn occupied(&self) -> Option<(i32, i32, i32, i32)> {
        let mut iter = self.cells.iter();
        let &(fx, fy) = iter.next()?;
        Some(iter.fold((fx, fy, fx, fy), |(x0, y0, x1, y1), &(x, y)| {
            (x0.min(x), y0.min(y), x1.max(x), y1.max(y))
        }))
    }
}

impl Shape for Hitgrid {
    fn kind(&self) -> ColliderType {
        ColliderType::HITGRID
    }

    fn local_bounds(&self) -> Rect {
        let Some((x0, y0, x1, y1)) = self.occupied() else {
            return Rect::default();
        };
        Rect::new(
            x0 as f32 * self.tile_width,
            y0 as f32 * self.tile_height,
            (x1 - x0 + 1) as f32 * self.tile_width,
            (y1 - y0 + 1) as f32 * self.tile_height,
        )
    }

    fn debug_draw(&self, gfx: &mut Graphics, origin: Vec2, color: Color) {
        for &(x, y) in &self.cells {
            let rect = Rect::new(
                origin.x + x as f32 * self.tile_width,
                origin.y + y as f32 * self.tile_height,
                self.tile_width,
                self.tile_height,
            );
            gfx.hollow_rect(rect, 1.0, color);
        }
    }
}

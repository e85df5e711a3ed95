use crate::assets::Texture;
use crate::coords::{Rect, Vec2};
use crate::graphics::DrawParams;
use crate::render::DrawCtx;
use crate::scene::{Component, ComponentState};

/// Grid of tileset cells drawn at the component's scene position.
///
/// With a camera, only the cells inside its visible extents are drawn.
#[derive(Debug, Clone)]
pub struct Tilemap {
    tileset: Vec<Texture>,
    tile_width: f32,
    tile_height: f32,
    columns: usize,
    rows: usize,
    tiles: Vec<Option<usize>>,
    pub params: DrawParams,
}

impl Tilemap {
    pub fn new(tile_width: f32, tile_height: f32, columns: usize, rows: usize) -> Self {
        Self {
            tileset: Vec::new(),
            tile_width,
            tile_height,
            columns,
            rows,
            tiles: vec![None; columns * rows],
            params: DrawParams::default(),
        }
    }

    /// Splits `texture` into cells of the tile size, row by row.
    pub fn with_tileset(mut self, texture: &Texture) -> Self {
        self.tileset = split(texture, self.tile_width, self.tile_height);
        self
    }

    #[inline]
    pub fn tileset(&self) -> &[Texture] {
        &self.tileset
    }

    #[inline]
    pub fn tile_size(&self) -> Vec2 {
        Vec2::new(self.tile_width, self.tile_height)
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    fn index(&self, tx: usize, ty: usize) -> Option<usize> {
        (tx < self.columns && ty < self.rows).then_some(ty * self.columns + tx)
    }

    /// Sets cell `(tx, ty)` to tileset entry `tile`. Out-of-range cells are ignored.
    pub fn set(&mut self, tx: usize, ty: usize, tile: Option<usize>) {
        if let Some(i) = self.index(tx, ty) {
            self.tiles[i] = tile;
        }
    }

    /// Fills a `columns × rows` block starting at `(tx, ty)`.
    pub fn fill(&mut self, tile: Option<usize>, tx: usize, ty: usize, columns: usize, rows: usize) {
        for y in ty..ty + rows {
            for x in tx..tx + columns {
                self.set(x, y, tile);
            }
        }
    }

    pub fn get(&self, tx: usize, ty: usize) -> Option<usize> {
        self.index(tx, ty).and_then(|i| self.tiles[i])
    }

    /// Cell range `(x0, y0, x1, y1)` (exclusive ends) overlapping `area`,
    /// where `area` is relative to the map's top-left corner.
    fn cells_in(&self, area: Rect) -> (usize, usize, usize, usize) {
        let clamp_x = |v: f32| (v.max(0.0) as usize).min(self.columns);
        let clamp_y = |v: f32| (v.max(0.0) as usize).min(self.rows);
        (
            clamp_x((area.left() / self.tile_width).floor()),
            clamp_y((area.top() / self.tile_height).floor()),
            clamp_x((area.right() / self.tile_width).ceil()),
            clamp_y((area.bottom() / self.tile_height).ceil()),
        )
    }
}

fn split(texture: &Texture, tile_width: f32, tile_height: f32) -> Vec<Texture> {
    if tile_width <= 0.0 || tile_height <= 0.0 {
        return Vec::new();
    }
    let columns = (texture.width() / tile_width) as usize;
    let rows = (texture.height() / tile_height) as usize;
    let mut cells = Vec::with_capacity(columns * rows);
    for y in 0..rows {
        for x in 0..columns {
            let clip = Rect::new(x as f32 * tile_width, y as f32 * tile_height, tile_width, tile_height);
            cells.push(texture.subtexture(clip));
        }
    }
    cells
}

impl Component for Tilemap {
    fn render(&mut self, _state: &ComponentState, ctx: &mut DrawCtx<'_>) {
        let origin = ctx.position;
        let (x0, y0, x1, y1) = match ctx.visible_bounds() {
            Some(view) => self.cells_in(Rect::new(view.x - origin.x, view.y - origin.y, view.width, view.height)),
            None => (0, 0, self.columns, self.rows),
        };

        for ty in y0..y1 {
            for tx in x0..x1 {
                let Some(texture) = self.get(tx, ty).and_then(|t| self.tileset.get(t)) else {
                    continue;
                };
                let at = origin + Vec2::new(tx as f32 * self.tile_width, ty as f32 * self.tile_height);
                ctx.gfx.texture(texture, at, self.params);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::GpuImage;
    use crate::coords::Viewport;
    use crate::gpu::{GpuCommand, ImageId, RecordingBackend};
    use crate::graphics::{Graphics, GraphicsConfig};
    use crate::render::Camera;

    fn sheet() -> Texture {
        Texture::from_image(GpuImage { id: ImageId(0), width: 32, height: 16 })
    }

    // ── cells ─────────────────────────────────────────────────────────────

    #[test]
    fn tileset_splits_row_major() {
        let map = Tilemap::new(8.0, 8.0, 4, 4).with_tileset(&sheet());
        assert_eq!(map.tileset().len(), 8);
        assert_eq!(map.tileset()[5].bounds, Rect::new(8.0, 8.0, 8.0, 8.0));
    }

    #[test]
    fn set_and_get_ignore_out_of_range() {
        let mut map = Tilemap::new(8.0, 8.0, 2, 2);
        map.set(1, 1, Some(3));
        map.set(5, 0, Some(1));
        assert_eq!(map.get(1, 1), Some(3));
        assert_eq!(map.get(5, 0), None);
        assert_eq!(map.get(0, 0), None);
    }

    #[test]
    fn fill_clips_to_map() {
        let mut map = Tilemap::new(8.0, 8.0, 3, 3);
        map.fill(Some(0), 1, 1, 5, 5);
        assert_eq!(map.get(2, 2), Some(0));
        assert_eq!(map.get(0, 1), None);
    }

    #[test]
    fn cells_in_clamps_to_grid() {
        let map = Tilemap::new(8.0, 8.0, 10, 10);
        assert_eq!(map.cells_in(Rect::new(-20.0, 4.0, 30.0, 8.0)), (0, 0, 2, 2));
        assert_eq!(map.cells_in(Rect::new(60.0, 60.0, 100.0, 100.0)), (7, 7, 10, 10));
    }

    // ── render ────────────────────────────────────────────────────────────

    fn drawn_quads(map: &mut Tilemap, camera: Option<&Camera>) -> usize {
        let (backend, _log) = RecordingBackend::new();
        let mut gfx = Graphics::new(Box::new(backend), GraphicsConfig::default()).unwrap();
        gfx.reset();
        let before = gfx.batched_vertices();
        let mut ctx = DrawCtx { gfx: &mut gfx, camera, position: Vec2::zero() };
        map.render(&ComponentState::default(), &mut ctx);
        (gfx.batched_vertices() - before) / 6
    }

    #[test]
    fn renders_only_filled_cells() {
        let mut map = Tilemap::new(8.0, 8.0, 4, 4).with_tileset(&sheet());
        map.set(0, 0, Some(0));
        map.set(3, 3, Some(1));
        map.set(2, 2, Some(99));
        assert_eq!(drawn_quads(&mut map, None), 2);
    }

    #[test]
    fn camera_culls_offscreen_cells() {
        let mut map = Tilemap::new(8.0, 8.0, 100, 1).with_tileset(&sheet());
        map.fill(Some(0), 0, 0, 100, 1);
        let camera = Camera::new(Viewport::new(32.0, 8.0));
        assert_eq!(drawn_quads(&mut map, Some(&camera)), 4);
    }

    #[test]
    fn no_draw_without_tileset() {
        let mut map = Tilemap::new(8.0, 8.0, 2, 2);
        map.fill(Some(0), 0, 0, 2, 2);
        let (backend, log) = RecordingBackend::new();
        let mut gfx = Graphics::new(Box::new(backend), GraphicsConfig::default()).unwrap();
        gfx.reset();
        let mut ctx = DrawCtx { gfx: &mut gfx, camera: None, position: Vec2::zero() };
        map.render(&ComponentState::default(), &mut ctx);
        gfx.flush();
        assert!(!log.borrow().iter().any(|c| matches!(c, GpuCommand::DrawTriangles(_))));
    }
}

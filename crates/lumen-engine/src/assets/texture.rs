use crate::coords::Rect;
use crate::gpu::ImageId;

/// Backing GPU image and its pixel size.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GpuImage {
    pub id: ImageId,
    pub width: u32,
    pub height: u32,
}

/// Region of a GPU image.
///
/// `bounds` is the stored pixel rectangle inside the image. `frame` places
/// those pixels inside the logical (untrimmed) sprite: its x/y are the
/// negated left/top padding and its size is the logical size.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Texture {
    pub image: GpuImage,
    pub bounds: Rect,
    pub frame: Rect,
}

impl Texture {
    pub fn new(image: GpuImage, bounds: Rect, frame: Rect) -> Self {
        Self { image, bounds, frame }
    }

    /// The whole image, untrimmed.
    pub fn from_image(image: GpuImage) -> Self {
        let full = Rect::new(0.0, 0.0, image.width as f32, image.height as f32);
        Self { image, bounds: full, frame: full }
    }

    /// Untrimmed region `bounds` of `image`.
    pub fn region(image: GpuImage, bounds: Rect) -> Self {
        Self { image, bounds, frame: Rect::new(0.0, 0.0, bounds.width, bounds.height) }
    }

    /// Logical width.
    #[inline]
    pub fn width(&self) -> f32 {
        self.frame.width
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.frame.height
    }

    /// Stored width.
    #[inline]
    pub fn clipped_width(&self) -> f32 {
        self.bounds.width
    }

    #[inline]
    pub fn clipped_height(&self) -> f32 {
        self.bounds.height
    }

    /// Sub-region `clip`, given in logical coordinates.
    ///
    /// The result's bounds never leave this texture's bounds and its frame
    /// offsets stay at or below zero.
    pub fn subtexture(&self, clip: Rect) -> Texture {
        let b = self.bounds;
        let f = self.frame;

        let x = b.x + (clip.x + f.x).min(b.width).max(0.0);
        let y = b.y + (clip.y + f.y).min(b.height).max(0.0);
        let right = b.x + (clip.x + f.x + clip.width).min(b.width);
        let bottom = b.y + (clip.y + f.y + clip.height).min(b.height);

        Texture {
            image: self.image,
            bounds: Rect::new(x, y, (right - x).max(0.0), (bottom - y).max(0.0)),
            frame: Rect::new((f.x + clip.x).min(0.0), (f.y + clip.y).min(0.0), clip.width, clip.height),
        }
    }

    /// Normalized `(u0, v0, u1, v1)` of the stored pixels.
    pub fn uv_rect(&self) -> (f32, f32, f32, f32) {
        let w = self.image.width.max(1) as f32;
        let h = self.image.height.max(1) as f32;
        (
            self.bounds.x / w,
            self.bounds.y / h,
            self.bounds.right() / w,
            self.bounds.bottom() / h,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> GpuImage {
        GpuImage { id: ImageId(0), width: 64, height: 64 }
    }

    fn trimmed() -> Texture {
        // 16x16 logical sprite stored as 10x12 pixels with 3px left and 2px top padding.
        Texture::new(image(), Rect::new(20.0, 8.0, 10.0, 12.0), Rect::new(-3.0, -2.0, 16.0, 16.0))
    }

    fn assert_contained(parent: &Texture, sub: &Texture) {
        let (p, s) = (parent.bounds, sub.bounds);
        assert!(s.width >= 0.0 && s.height >= 0.0, "{s:?}");
        assert!(s.left() >= p.left() && s.right() <= p.right(), "{s:?} outside {p:?}");
        assert!(s.top() >= p.top() && s.bottom() <= p.bottom(), "{s:?} outside {p:?}");
        assert!(sub.frame.x <= 0.0 && sub.frame.y <= 0.0, "{:?}", sub.frame);
    }

    #[test]
    fn sizes_come_from_frame_and_bounds() {
        let t = trimmed();
        assert_eq!((t.width(), t.height()), (16.0, 16.0));
        assert_eq!((t.clipped_width(), t.clipped_height()), (10.0, 12.0));
    }

    #[test]
    fn subtexture_of_untrimmed_region() {
        let t = Texture::region(image(), Rect::new(16.0, 16.0, 32.0, 32.0));
        let sub = t.subtexture(Rect::new(8.0, 4.0, 8.0, 8.0));
        assert_eq!(sub.bounds, Rect::new(24.0, 20.0, 8.0, 8.0));
        assert_eq!(sub.frame, Rect::new(0.0, 0.0, 8.0, 8.0));
    }

    #[test]
    fn subtexture_through_padding_keeps_offset() {
        let sub = trimmed().subtexture(Rect::new(0.0, 0.0, 8.0, 8.0));
        // padding consumes the first 3 columns and 2 rows of the clip
        assert_eq!(sub.bounds, Rect::new(20.0, 8.0, 5.0, 6.0));
        assert_eq!(sub.frame, Rect::new(-3.0, -2.0, 8.0, 8.0));
    }

    #[test]
    fn subtexture_stays_inside_parent() {
        let parents = [trimmed(), Texture::from_image(image())];
        let coords = [-40.0, -3.0, 0.0, 5.0, 15.0, 70.0];
        let sizes = [0.0, 1.0, 9.0, 100.0];
        for parent in &parents {
            for &x in &coords {
                for &y in &coords {
                    for &w in &sizes {
                        for &h in &sizes {
                            assert_contained(parent, &parent.subtexture(Rect::new(x, y, w, h)));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn uv_rect_normalizes_bounds() {
        let t = Texture::region(image(), Rect::new(16.0, 32.0, 16.0, 16.0));
        assert_eq!(t.uv_rect(), (0.25, 0.5, 0.5, 0.75));
    }
}

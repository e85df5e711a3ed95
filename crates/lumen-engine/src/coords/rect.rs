use super::Vec2;

/// Axis-aligned rectangle in pixels (top-left origin).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle whose omitted width/height default to 1.
    ///
    /// Only `None` selects the default; an explicit `Some(0.0)` is kept.
    #[inline]
    pub fn sized(x: f32, y: f32, width: Option<f32>, height: Option<f32>) -> Self {
        Self::new(x, y, width.unwrap_or(1.0), height.unwrap_or(1.0))
    }

    #[inline]
    pub fn left(self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn top(self) -> f32 {
        self.y
    }

    #[inline]
    pub fn bottom(self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn position(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    pub fn size(self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Half-open containment: [min, max).
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        p.x >= self.left() && p.y >= self.top() && p.x < self.right() && p.y < self.bottom()
    }

    /// Half-open overlap. Rectangles that only share an edge do not overlap.
    #[inline]
    pub fn overlaps(self, other: Rect) -> bool {
        self.right() > other.left()
            && self.bottom() > other.top()
            && self.left() < other.right()
            && self.top() < other.bottom()
    }

    /// Clamps `target` so it lies within `self`. Width and height never go negative.
    pub fn crop_rect(self, target: &mut Rect) {
        if target.x < self.x {
            target.width += target.x - self.x;
            target.x = self.x;
        }
        if target.y < self.y {
            target.height += target.y - self.y;
            target.y = self.y;
        }
        if target.x > self.right() {
            target.x = self.right();
            target.width = 0.0;
        }
        if target.y > self.bottom() {
            target.y = self.bottom();
            target.height = 0.0;
        }
        if target.right() > self.right() {
            target.width = self.right() - target.x;
        }
        if target.bottom() > self.bottom() {
            target.height = self.bottom() - target.y;
        }
        target.width = target.width.max(0.0);
        target.height = target.height.max(0.0);
    }

    #[inline]
    pub fn cropped(self, mut target: Rect) -> Rect {
        self.crop_rect(&mut target);
        target
    }

    /// Smallest rectangle containing every point.
    pub fn bounding(points: &[Vec2]) -> Rect {
        let Some(first) = points.first() else {
            return Rect::default();
        };
        let (mut min, mut max) = (*first, *first);
        for p in &points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Rect::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }
}

use crate::coords::{Mat3, Rect, Vec2, Viewport};

/// 2D camera over a render target.
///
/// World points map to target pixels through
/// `translate(origin) · rotate · scale · translate(-position)`, so `position`
/// lands on `origin` and rotation and scale pivot around it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec2,
    pub origin: Vec2,
    pub scale: Vec2,
    pub rotation: f32,
    viewport: Viewport,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Viewport::new(320.0, 180.0))
    }
}

impl Camera {
    pub fn new(viewport: Viewport) -> Self {
        Self { position: Vec2::zero(), origin: Vec2::zero(), scale: Vec2::one(), rotation: 0.0, viewport }
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Renderers call this with their target size before each pass.
    #[inline]
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Puts the origin at the middle of the viewport so `position` is centered on screen.
    pub fn centered(mut self) -> Self {
        self.origin = Vec2::new(self.viewport.width / 2.0, self.viewport.height / 2.0);
        self
    }

    /// World → target pixels.
    pub fn internal(&self) -> Mat3 {
        let mut m = Mat3::identity();
        m.translate(self.origin.x, self.origin.y)
            .rotate(self.rotation)
            .scale(self.scale.x, self.scale.y)
            .translate(-self.position.x, -self.position.y);
        m
    }

    /// World → normalized device coordinates.
    pub fn matrix(&self) -> Mat3 {
        Mat3::orthographic(self.viewport.width, self.viewport.height) * self.internal()
    }

    /// World-space bounds of everything the camera can see.
    pub fn extents(&self) -> Rect {
        let inv = self.internal().inverted();
        let (w, h) = (self.viewport.width, self.viewport.height);
        let corners = [Vec2::new(0.0, 0.0), Vec2::new(w, 0.0), Vec2::new(w, h), Vec2::new(0.0, h)];
        Rect::bounding(&corners.map(|c| inv.transform_point(c)))
    }

    /// Maps a target-space point (e.g. the mouse in buffer pixels) into the world.
    pub fn mouse(&self, point: Vec2) -> Vec2 {
        self.internal().inverted().transform_point(point)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn cam() -> Camera {
        Camera::new(Viewport::new(320.0, 180.0))
    }

    fn assert_vec(a: Vec2, b: Vec2) {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-4);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-4);
    }

    fn assert_rect(a: Rect, b: Rect) {
        assert_vec(a.position(), b.position());
        assert_vec(a.size(), b.size());
    }

    #[test]
    fn default_camera_sees_viewport() {
        assert_rect(cam().extents(), Rect::new(0.0, 0.0, 320.0, 180.0));
        assert_eq!(cam().internal(), Mat3::identity());
    }

    #[test]
    fn position_shifts_extents_and_mouse() {
        let mut c = cam();
        c.position = Vec2::new(100.0, 50.0);
        assert_rect(c.extents(), Rect::new(100.0, 50.0, 320.0, 180.0));
        assert_vec(c.mouse(Vec2::new(0.0, 0.0)), Vec2::new(100.0, 50.0));
    }

    #[test]
    fn centered_origin_puts_position_mid_screen() {
        let mut c = cam().centered();
        c.position = Vec2::new(100.0, 50.0);
        assert_vec(c.mouse(Vec2::new(160.0, 90.0)), Vec2::new(100.0, 50.0));
        assert_vec(c.mouse(Vec2::new(0.0, 0.0)), Vec2::new(-60.0, -40.0));
    }

    #[test]
    fn zoom_shrinks_extents() {
        let mut c = cam();
        c.scale = Vec2::new(2.0, 2.0);
        assert_rect(c.extents(), Rect::new(0.0, 0.0, 160.0, 90.0));
    }

    #[test]
    fn rotation_turns_the_world() {
        let mut c = cam();
        c.rotation = std::f32::consts::FRAC_PI_2;
        assert_vec(c.internal().transform_point(Vec2::new(1.0, 0.0)), Vec2::new(0.0, 1.0));
        assert_vec(c.mouse(Vec2::new(0.0, 1.0)), Vec2::new(1.0, 0.0));
        let e = c.extents();
        assert_relative_eq!(e.width, 180.0, epsilon = 1e-3);
        assert_relative_eq!(e.height, 320.0, epsilon = 1e-3);
    }

    #[test]
    fn matrix_maps_viewport_to_ndc() {
        let c = cam();
        assert_vec(c.matrix().transform_point(Vec2::new(0.0, 0.0)), Vec2::new(-1.0, 1.0));
        assert_vec(c.matrix().transform_point(Vec2::new(320.0, 180.0)), Vec2::new(1.0, -1.0));
    }
}

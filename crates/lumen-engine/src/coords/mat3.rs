use std::ops::Mul;

use super::Vec2;

/// 2D affine transform stored as a column-major homogeneous 3×3 matrix.
///
/// Layout matches what the GPU expects for a `mat3x3<f32>` column by column:
/// `[m00, m01, m02, m10, m11, m12, tx, ty, 1]`.
///
/// `translate`, `rotate`, `scale` and `multiply` all post-multiply, so a chain
/// `identity().translate(o).rotate(r)` applies the rotation to points first.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat3 {
    m: [f32; 9],
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat3 {
    #[inline]
    pub const fn identity() -> Self {
        Self { m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0] }
    }

    #[inline]
    pub const fn from_array(m: [f32; 9]) -> Self {
        Self { m }
    }

    #[inline]
    pub const fn as_array(&self) -> &[f32; 9] {
        &self.m
    }

    /// Orthographic projection mapping a `width`×`height` pixel space
    /// (origin top-left, +Y down) to normalized device coordinates.
    pub fn orthographic(width: f32, height: f32) -> Self {
        let mut m = Self::identity();
        m.translate(-1.0, 1.0)
            .scale(2.0 / width.max(1.0), -2.0 / height.max(1.0));
        m
    }

    pub fn set_identity(&mut self) -> &mut Self {
        *self = Self::identity();
        self
    }

    pub fn determinant(&self) -> f32 {
        let [a00, a01, a02, a10, a11, a12, a20, a21, a22] = self.m;
        a00 * (a22 * a11 - a12 * a21)
            + a01 * (-a22 * a10 + a12 * a20)
            + a02 * (a21 * a10 - a11 * a20)
    }

    /// Inverts in place. A singular matrix is left untouched.
    pub fn invert(&mut self) -> &mut Self {
        let [a00, a01, a02, a10, a11, a12, a20, a21, a22] = self.m;

        let b01 = a22 * a11 - a12 * a21;
        let b11 = -a22 * a10 + a12 * a20;
        let b21 = a21 * a10 - a11 * a20;

        let det = a00 * b01 + a01 * b11 + a02 * b21;
        if det == 0.0 || !det.is_finite() {
            return self;
        }
        let inv = 1.0 / det;

        self.m = [
            b01 * inv,
            (-a22 * a01 + a02 * a21) * inv,
            (a12 * a01 - a02 * a11) * inv,
            b11 * inv,
            (a22 * a00 - a02 * a20) * inv,
            (-a12 * a00 + a02 * a10) * inv,
            b21 * inv,
            (-a21 * a00 + a01 * a20) * inv,
            (a11 * a00 - a01 * a10) * inv,
        ];
        self
    }

    #[inline]
    pub fn inverted(mut self) -> Self {
        self.invert();
        self
    }

    /// `self = self * other`.
    pub fn multiply(&mut self, other: &Mat3) -> &mut Self {
        let [a00, a01, a02, a10, a11, a12, a20, a21, a22] = self.m;
        let [b00, b01, b02, b10, b11, b12, b20, b21, b22] = other.m;

        self.m = [
            b00 * a00 + b01 * a10 + b02 * a20,
            b00 * a01 + b01 * a11 + b02 * a21,
            b00 * a02 + b01 * a12 + b02 * a22,
            b10 * a00 + b11 * a10 + b12 * a20,
            b10 * a01 + b11 * a11 + b12 * a21,
            b10 * a02 + b11 * a12 + b12 * a22,
            b20 * a00 + b21 * a10 + b22 * a20,
            b20 * a01 + b21 * a11 + b22 * a21,
            b20 * a02 + b21 * a12 + b22 * a22,
        ];
        self
    }

    pub fn translate(&mut self, x: f32, y: f32) -> &mut Self {
        let [a00, a01, a02, a10, a11, a12, a20, a21, a22] = self.m;
        self.m[6] = x * a00 + y * a10 + a20;
        self.m[7] = x * a01 + y * a11 + a21;
        self.m[8] = x * a02 + y * a12 + a22;
        self
    }

    /// Rotates by `radians`.
    pub fn rotate(&mut self, radians: f32) -> &mut Self {
        let [a00, a01, a02, a10, a11, a12, ..] = self.m;
        let (s, c) = radians.sin_cos();
        self.m[0] = c * a00 + s * a10;
        self.m[1] = c * a01 + s * a11;
        self.m[2] = c * a02 + s * a12;
        self.m[3] = c * a10 - s * a00;
        self.m[4] = c * a11 - s * a01;
        self.m[5] = c * a12 - s * a02;
        self
    }

    pub fn scale(&mut self, x: f32, y: f32) -> &mut Self {
        for i in 0..3 {
            self.m[i] *= x;
            self.m[i + 3] *= y;
        }
        self
    }

    /// Applies the transform to a point (w = 1).
    #[inline]
    pub fn transform_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            self.m[0] * p.x + self.m[3] * p.y + self.m[6],
            self.m[1] * p.x + self.m[4] * p.y + self.m[7],
        )
    }
}

impl Mul for Mat3 {
    type Output = Mat3;
    #[inline]
    fn mul(mut self, rhs: Mat3) -> Mat3 {
        self.multiply(&rhs);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_mat_eq(a: &Mat3, b: &Mat3) {
        for (x, y) in a.as_array().iter().zip(b.as_array()) {
            assert_abs_diff_eq!(*x, *y, epsilon = 1e-4);
        }
    }

    fn sample() -> Mat3 {
        let mut m = Mat3::identity();
        m.translate(12.0, -7.5).rotate(0.6).scale(2.0, 3.0);
        m
    }

    #[test]
    fn invert_twice_round_trips() {
        let m = sample();
        let back = m.inverted().inverted();
        assert_mat_eq(&back, &m);
    }

    #[test]
    fn invert_singular_is_noop() {
        let mut m = Mat3::identity();
        m.scale(0.0, 1.0);
        let before = m;
        m.invert();
        assert_eq!(m, before);
        assert!(m.as_array().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn inverse_times_matrix_is_identity() {
        let m = sample();
        assert_mat_eq(&(m * m.inverted()), &Mat3::identity());
    }

    #[test]
    fn translate_then_scale_applies_scale_first() {
        let mut m = Mat3::identity();
        m.translate(10.0, 0.0).scale(2.0, 2.0);
        let p = m.transform_point(Vec2::new(1.0, 1.0));
        assert_abs_diff_eq!(p.x, 12.0);
        assert_abs_diff_eq!(p.y, 2.0);
    }

    #[test]
    fn orthographic_maps_corners_to_ndc() {
        let m = Mat3::orthographic(320.0, 180.0);
        let tl = m.transform_point(Vec2::zero());
        let br = m.transform_point(Vec2::new(320.0, 180.0));
        assert_abs_diff_eq!(tl.x, -1.0);
        assert_abs_diff_eq!(tl.y, 1.0);
        assert_abs_diff_eq!(br.x, 1.0);
        assert_abs_diff_eq!(br.y, -1.0);
    }
}

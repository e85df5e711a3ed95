/// Straight-alpha RGBA color.
///
/// Invariant: every channel lies in [0, 1]. Construction and each setter clamp
/// their inputs; values above 1 are logged at debug level since they usually
/// mean a 0..255 literal was passed where a unit float was expected.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Color {
    r: f32,
    g: f32,
    b: f32,
    a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::white()
    }
}

#[inline]
fn clamp_channel(name: &str, v: f32) -> f32 {
    if v > 1.0 {
        log::debug!("color channel {name}={v} out of range, clamped to 1");
    }
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

impl Color {
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            r: clamp_channel("r", r),
            g: clamp_channel("g", g),
            b: clamp_channel("b", b),
            a: clamp_channel("a", a),
        }
    }

    #[inline]
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    #[inline]
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    /// `0xRRGGBB`, fully opaque.
    #[inline]
    pub fn from_hex(hex: u32) -> Self {
        Self::from_rgba8((hex >> 16) as u8, (hex >> 8) as u8, hex as u8, 255)
    }

    pub const fn white() -> Self {
        Self { r: 1.0, g: 1.0, b: 1.0, a: 1.0 }
    }

    pub const fn black() -> Self {
        Self { r: 0.0, g: 0.0, b: 0.0, a: 1.0 }
    }

    pub const fn red() -> Self {
        Self { r: 1.0, g: 0.0, b: 0.0, a: 1.0 }
    }

    pub const fn green() -> Self {
        Self { r: 0.0, g: 1.0, b: 0.0, a: 1.0 }
    }

    pub const fn blue() -> Self {
        Self { r: 0.0, g: 0.0, b: 1.0, a: 1.0 }
    }

    pub const fn transparent() -> Self {
        Self { r: 0.0, g: 0.0, b: 0.0, a: 0.0 }
    }

    #[inline]
    pub fn r(self) -> f32 {
        self.r
    }

    #[inline]
    pub fn g(self) -> f32 {
        self.g
    }

    #[inline]
    pub fn b(self) -> f32 {
        self.b
    }

    #[inline]
    pub fn a(self) -> f32 {
        self.a
    }

    pub fn set_r(&mut self, v: f32) {
        self.r = clamp_channel("r", v);
    }

    pub fn set_g(&mut self, v: f32) {
        self.g = clamp_channel("g", v);
    }

    pub fn set_b(&mut self, v: f32) {
        self.b = clamp_channel("b", v);
    }

    pub fn set_a(&mut self, v: f32) {
        self.a = clamp_channel("a", v);
    }

    /// Copy with alpha multiplied by `alpha`.
    #[inline]
    pub fn mult(self, alpha: f32) -> Self {
        Self { a: clamp_channel("a", self.a * alpha), ..self }
    }

    pub fn lerp(self, other: Color, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a + (other.a - self.a) * t,
        )
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_channels_are_clamped() {
        let c = Color::new(200.0, -1.0, 0.5, 0.5);
        assert_eq!(c.to_array(), [1.0, 0.0, 0.5, 0.5]);
    }

    #[test]
    fn setters_clamp() {
        let mut c = Color::black();
        c.set_g(3.0);
        c.set_a(-2.0);
        assert_eq!(c.g(), 1.0);
        assert_eq!(c.a(), 0.0);
    }

    #[test]
    fn mult_scales_alpha_only() {
        let c = Color::new(0.2, 0.4, 0.6, 0.8).mult(0.5);
        assert_eq!(c.r(), 0.2);
        assert!((c.a() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn hex_unpacks_channels() {
        let c = Color::from_hex(0xff8000);
        assert_eq!(c.r(), 1.0);
        assert!((c.g() - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.b(), 0.0);
        assert_eq!(c.a(), 1.0);
    }
}

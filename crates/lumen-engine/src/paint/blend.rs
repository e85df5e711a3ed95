/// Blend factor applied to the source or destination color.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
    OneMinusDstColor,
    DstAlpha,
    OneMinusDstAlpha,
}

/// Fixed-function blend equation (`src * color + dst * target`).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BlendMode {
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl BlendMode {
    pub const NORMAL: BlendMode = BlendMode::new(BlendFactor::One, BlendFactor::OneMinusSrcAlpha);
    pub const ADD: BlendMode = BlendMode::new(BlendFactor::One, BlendFactor::DstAlpha);
    pub const MULTIPLY: BlendMode = BlendMode::new(BlendFactor::DstColor, BlendFactor::OneMinusSrcAlpha);
    pub const SCREEN: BlendMode = BlendMode::new(BlendFactor::One, BlendFactor::OneMinusSrcColor);

    pub const fn new(src: BlendFactor, dst: BlendFactor) -> Self {
        Self { src, dst }
    }
}

impl Default for BlendMode {
    fn default() -> Self {
        Self::NORMAL
    }
}

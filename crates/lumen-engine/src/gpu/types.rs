use crate::coords::Mat3;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

handle!(
    /// Compiled GPU program.
    ProgramId
);
handle!(
    /// GPU image (texture storage). Compared by identity, never by content.
    ImageId
);
handle!(
    /// Offscreen framebuffer.
    TargetId
);

/// Declared type of a shader uniform.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UniformKind {
    Float,
    Int,
    Vec2,
    Vec3,
    Vec4,
    Mat3,
    Mat4,
    Sampler2D,
}

impl UniformKind {
    pub fn name(self) -> &'static str {
        match self {
            UniformKind::Float => "float",
            UniformKind::Int => "int",
            UniformKind::Vec2 => "vec2",
            UniformKind::Vec3 => "vec3",
            UniformKind::Vec4 => "vec4",
            UniformKind::Mat3 => "mat3",
            UniformKind::Mat4 => "mat4",
            UniformKind::Sampler2D => "sampler2D",
        }
    }

    /// Placeholder value a freshly compiled uniform starts with.
    pub fn default_value(self) -> UniformValue {
        match self {
            UniformKind::Float => UniformValue::Float(0.0),
            UniformKind::Int => UniformValue::Int(0),
            UniformKind::Vec2 => UniformValue::Vec2([0.0; 2]),
            UniformKind::Vec3 => UniformValue::Vec3([0.0; 3]),
            UniformKind::Vec4 => UniformValue::Vec4([0.0; 4]),
            UniformKind::Mat3 => UniformValue::Mat3(Mat3::identity()),
            UniformKind::Mat4 => UniformValue::Mat4([
                1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
            ]),
            UniformKind::Sampler2D => UniformValue::Sampler(None),
        }
    }
}

/// Value held by a uniform. Sampler equality is GPU-handle identity.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat3(Mat3),
    Mat4([f32; 16]),
    Sampler(Option<ImageId>),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Mat3(_) => UniformKind::Mat3,
            UniformValue::Mat4(_) => UniformKind::Mat4,
            UniformValue::Sampler(_) => UniformKind::Sampler2D,
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<Mat3> for UniformValue {
    fn from(m: Mat3) -> Self {
        UniformValue::Mat3(m)
    }
}

impl From<ImageId> for UniformValue {
    fn from(id: ImageId) -> Self {
        UniformValue::Sampler(Some(id))
    }
}

/// Vertex stream a shader attribute is fed from.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AttributeRole {
    Position,
    Texcoord,
    Color,
}

impl AttributeRole {
    /// Floats per vertex.
    pub fn components(self) -> u32 {
        match self {
            AttributeRole::Position | AttributeRole::Texcoord => 2,
            AttributeRole::Color => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniformDecl {
    pub name: String,
    pub kind: UniformKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDecl {
    pub name: String,
    pub role: AttributeRole,
}

/// Program source plus its declared interface.
///
/// Uniform and attribute locations are their declaration indices. WGSL
/// sources use `vs_main`/`fs_main`, bind non-sampler uniforms as one block at
/// `@group(0) @binding(0)` in declaration order, the sampler's texture and
/// sampler at `@group(1)` bindings 0 and 1, and attribute `i` at `@location(i)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderSource {
    pub name: String,
    pub vertex: String,
    pub fragment: String,
    pub uniforms: Vec<UniformDecl>,
    pub attributes: Vec<AttributeDecl>,
}

impl ShaderSource {
    pub fn new(name: impl Into<String>, vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vertex: vertex.into(),
            fragment: fragment.into(),
            uniforms: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn uniform(mut self, name: impl Into<String>, kind: UniformKind) -> Self {
        self.uniforms.push(UniformDecl { name: name.into(), kind });
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, role: AttributeRole) -> Self {
        self.attributes.push(AttributeDecl { name: name.into(), role });
        self
    }

    /// Vertex and fragment stages as one WGSL module; identical stages are not duplicated.
    pub fn combined_wgsl(&self) -> String {
        if self.vertex == self.fragment {
            self.vertex.clone()
        } else {
            format!("{}\n{}", self.vertex, self.fragment)
        }
    }
}

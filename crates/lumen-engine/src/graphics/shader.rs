use crate::error::{EngineError, Result};
use crate::gpu::{AttributeRole, ImageId, ProgramId, ShaderSource, UniformKind, UniformValue};

/// Index of a shader owned by `Graphics`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ShaderId(pub(crate) usize);

/// Typed uniform with change tracking.
#[derive(Debug, Clone)]
pub struct Uniform {
    name: String,
    kind: UniformKind,
    location: u32,
    value: UniformValue,
    dirty: bool,
}

impl Uniform {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> UniformKind {
        self.kind
    }

    pub fn location(&self) -> u32 {
        self.location
    }

    pub fn value(&self) -> &UniformValue {
        &self.value
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Assigns `value`, returning whether it differed from the stored one.
    ///
    /// Samplers compare by image handle, so rebinding the same image is free.
    fn assign(&mut self, value: UniformValue) -> Result<bool> {
        if value.kind() != self.kind {
            return Err(EngineError::UniformType {
                name: self.name.clone(),
                expected: self.kind.name(),
                found: value.kind().name(),
            });
        }
        if value == self.value {
            return Ok(false);
        }
        self.value = value;
        self.dirty = true;
        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub role: AttributeRole,
    pub location: u32,
}

/// Compiled program plus its uniform and attribute bindings.
#[derive(Debug, Clone)]
pub struct Shader {
    name: String,
    program: ProgramId,
    uniforms: Vec<Uniform>,
    attributes: Vec<Attribute>,
    sampler: Option<usize>,
    dirty: bool,
}

impl Shader {
    /// Binds a compiled `program` to the interface declared in `source`.
    ///
    /// At most one `sampler2D` uniform is allowed.
    pub fn new(program: ProgramId, source: &ShaderSource) -> Result<Self> {
        let uniforms: Vec<Uniform> = source
            .uniforms
            .iter()
            .enumerate()
            .map(|(i, d)| Uniform {
                name: d.name.clone(),
                kind: d.kind,
                location: i as u32,
                value: d.kind.default_value(),
                dirty: false,
            })
            .collect();

        let mut samplers = uniforms.iter().enumerate().filter(|(_, u)| u.kind == UniformKind::Sampler2D);
        let sampler = samplers.next().map(|(i, _)| i);
        if samplers.next().is_some() {
            return Err(EngineError::MultipleSamplers { shader: source.name.clone() });
        }

        let attributes = source
            .attributes
            .iter()
            .enumerate()
            .map(|(i, a)| Attribute { name: a.name.clone(), role: a.role, location: i as u32 })
            .collect();

        Ok(Self {
            name: source.name.clone(),
            program,
            uniforms,
            attributes,
            sampler,
            dirty: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> ProgramId {
        self.program
    }

    pub fn uniforms(&self) -> &[Uniform] {
        &self.uniforms
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn uniform(&self, name: &str) -> Option<&Uniform> {
        self.uniforms.iter().find(|u| u.name == name)
    }

    /// The primary `sampler2D` uniform, if declared.
    pub fn sampler(&self) -> Option<&Uniform> {
        self.sampler.map(|i| &self.uniforms[i])
    }

    pub fn has_sampler(&self) -> bool {
        self.sampler.is_some()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Assigns a uniform by name. A changed value marks the uniform and the shader dirty.
    pub fn set(&mut self, name: &str, value: impl Into<UniformValue>) -> Result<()> {
        let Some(uniform) = self.uniforms.iter_mut().find(|u| u.name == name) else {
            return Err(EngineError::UnknownUniform { shader: self.name.clone(), name: name.to_owned() });
        };
        if uniform.assign(value.into())? {
            self.dirty = true;
        }
        Ok(())
    }

    /// Points the primary sampler at `image`. Returns `false` when there is no sampler.
    pub fn set_texture(&mut self, image: ImageId) -> bool {
        let Some(i) = self.sampler else { return false };
        if let Ok(true) = self.uniforms[i].assign(UniformValue::Sampler(Some(image))) {
            self.dirty = true;
        }
        true
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
        for u in &mut self.uniforms {
            u.dirty = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Mat3;

    fn source() -> ShaderSource {
        ShaderSource::new("test", "", "")
            .uniform("matrix", UniformKind::Mat3)
            .uniform("u_texture", UniformKind::Sampler2D)
            .uniform("time", UniformKind::Float)
            .attribute("a_position", AttributeRole::Position)
    }

    fn shader() -> Shader {
        Shader::new(ProgramId(0), &source()).unwrap()
    }

    // ── dirty tracking ────────────────────────────────────────────────────

    #[test]
    fn setting_equal_value_keeps_shader_clean() {
        let mut s = shader();
        s.set("time", 0.0_f32).unwrap();
        assert!(!s.is_dirty());
        assert!(!s.uniform("time").unwrap().is_dirty());
    }

    #[test]
    fn setting_new_value_marks_uniform_and_shader() {
        let mut s = shader();
        s.set("time", 1.5_f32).unwrap();
        assert!(s.is_dirty());
        assert!(s.uniform("time").unwrap().is_dirty());
        assert!(!s.uniform("matrix").unwrap().is_dirty());

        s.clear_dirty();
        s.set("time", 1.5_f32).unwrap();
        assert!(!s.is_dirty());
    }

    #[test]
    fn sampler_compares_by_handle() {
        let mut s = shader();
        assert!(s.set_texture(ImageId(3)));
        s.clear_dirty();
        s.set_texture(ImageId(3));
        assert!(!s.is_dirty());
        s.set_texture(ImageId(4));
        assert!(s.is_dirty());
    }

    // ── errors ────────────────────────────────────────────────────────────

    #[test]
    fn unknown_uniform_is_reported() {
        let mut s = shader();
        assert!(matches!(s.set("nope", 1.0_f32), Err(EngineError::UnknownUniform { .. })));
    }

    #[test]
    fn wrong_type_is_reported() {
        let mut s = shader();
        assert!(matches!(s.set("matrix", 1.0_f32), Err(EngineError::UniformType { .. })));
        s.set("matrix", Mat3::identity()).unwrap();
        assert!(!s.is_dirty());
    }

    #[test]
    fn two_samplers_are_rejected() {
        let src = source().uniform("u_other", UniformKind::Sampler2D);
        assert!(matches!(Shader::new(ProgramId(0), &src), Err(EngineError::MultipleSamplers { .. })));
    }

    #[test]
    fn locations_follow_declaration_order() {
        let s = shader();
        assert_eq!(s.uniform("time").unwrap().location(), 2);
        assert_eq!(s.attributes()[0].location, 0);
        assert_eq!(s.sampler().unwrap().name(), "u_texture");
    }
}

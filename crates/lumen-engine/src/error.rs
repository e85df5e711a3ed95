use std::fmt;

/// Errors reported by the engine library.
///
/// Programming errors (double attachment, unregistered overlap pairs, broken
/// shaders) surface here as well so callers decide whether to abort; nothing
/// in the library panics on them outside of `AssertMode::Strict`.
#[derive(Debug)]
pub enum EngineError {
    /// A component was attached while it already belongs to an entity or scene.
    AlreadyAttached { what: &'static str },
    /// The entity id does not name a live entity.
    UnknownEntity,
    /// The operation needs a detached entity but it is still in the scene.
    EntityAttached,
    /// The operation needs a scene-attached entity.
    EntityDetached,
    UnknownUniform { shader: String, name: String },
    UniformType { name: String, expected: &'static str, found: &'static str },
    MultipleSamplers { shader: String },
    ShaderCompile { shader: String, message: String },
    ShaderLink { shader: String, message: String },
    /// No overlap test is registered for this pair of collider types.
    UnregisteredOverlap { a: &'static str, b: &'static str },
    InvalidImage { width: u32, height: u32, len: usize },
    Atlas(String),
    Json(serde_json::Error),
    Image(image::ImageError),
    Io(std::io::Error),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyAttached { what } => write!(f, "component is already attached to {what}"),
            Self::UnknownEntity => f.write_str("entity does not exist"),
            Self::EntityAttached => f.write_str("entity is still attached to the scene"),
            Self::EntityDetached => f.write_str("entity is not attached to the scene"),
            Self::UnknownUniform { shader, name } => {
                write!(f, "shader `{shader}` has no uniform `{name}`")
            }
            Self::UniformType { name, expected, found } => {
                write!(f, "uniform `{name}` expects {expected}, got {found}")
            }
            Self::MultipleSamplers { shader } => {
                write!(f, "shader `{shader}` declares more than one sampler2D uniform")
            }
            Self::ShaderCompile { shader, message } => {
                write!(f, "shader `{shader}` failed to compile: {message}")
            }
            Self::ShaderLink { shader, message } => {
                write!(f, "shader `{shader}` failed to link: {message}")
            }
            Self::UnregisteredOverlap { a, b } => {
                write!(f, "no overlap test registered for ({a}, {b})")
            }
            Self::InvalidImage { width, height, len } => {
                write!(f, "{len} bytes is not a {width}x{height} RGBA8 image")
            }
            Self::Atlas(msg) => write!(f, "atlas: {msg}"),
            Self::Json(e) => write!(f, "json: {e}"),
            Self::Image(e) => write!(f, "image: {e}"),
            Self::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            Self::Image(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<image::ImageError> for EngineError {
    fn from(e: image::ImageError) -> Self {
        Self::Image(e)
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

/// How precondition failures in drawing code are reported.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssertMode {
    /// Panic on the first failure.
    Strict,
    /// Log a warning and continue with best-effort behavior.
    #[default]
    Normal,
}

impl AssertMode {
    /// Returns `condition`. On failure, panics in `Strict` mode and warns in `Normal` mode.
    #[track_caller]
    pub fn check(self, condition: bool, message: impl FnOnce() -> String) -> bool {
        if !condition {
            let message = message();
            match self {
                AssertMode::Strict => panic!("assertion failed: {message}"),
                AssertMode::Normal => log::warn!("{message}"),
            }
        }
        condition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_mode_reports_and_continues() {
        assert!(!AssertMode::Normal.check(false, || "missing sampler".into()));
        assert!(AssertMode::Normal.check(true, || unreachable!()));
    }

    #[test]
    #[should_panic(expected = "missing sampler")]
    fn strict_mode_panics() {
        AssertMode::Strict.check(false, || "missing sampler".into());
    }

    #[test]
    fn display_names_the_pair() {
        let e = EngineError::UnregisteredOverlap { a: "hitbox", b: "circle" };
        assert_eq!(e.to_string(), "no overlap test registered for (hitbox, circle)");
    }
}

use thiserror::Error;

/// Renderer failures that callers can act on.
///
/// Misuse that indicates a programming error (transform stack overflow) is a
/// panic instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("shader {label:?}: fragment source has no `fn fs_main` entry point")]
    MissingEntryPoint { label: String },

    #[error("shader {label:?} declares {count} uniforms, at most {max} are supported")]
    TooManyUniforms { label: String, count: usize, max: usize },

    #[error("shader {label:?}: uniform name {name:?} is not a valid identifier")]
    InvalidUniformName { label: String, name: String },

    #[error("shader {label:?} has no uniform named {name:?}")]
    UnknownUniform { label: String, name: String },

    #[error("uniform {name:?}: texture unit {unit} is not available (only unit 1)")]
    TextureUnit { name: String, unit: u32 },
}

//! GPU boundary of the batch renderer.
//!
//! The [`Renderer`](super::Renderer) owns all batching state and talks to the
//! GPU only through [`RenderBackend`]. Backends receive fully transformed
//! vertices plus a snapshot of the state a flush was issued with.

use crate::paint::Color;

use super::{BlendMode, RenderError, Vertex};

/// Backend-side texture id. Render targets are textures too.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Backend-side shader id.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(pub u32);

/// Maximum number of named uniforms a custom shader may declare.
///
/// Each uniform occupies one vec4 slot of the per-draw uniform block.
pub const MAX_SHADER_UNIFORMS: usize = 15;

/// Custom fragment stage compiled against the batch vertex stage.
///
/// `fragment` is WGSL that defines `fn fs_main(in: VsOut) -> @location(0) vec4<f32>`.
/// Every declared uniform is readable through a generated accessor
/// `u_<name>() -> vec4<f32>`; scalars and vectors are stored in the leading
/// components. `t_main`/`s_main` are the bound texture (white when
/// untextured), `t_aux`/`s_aux` the texture on unit 1, and `u_resolution()`
/// the size of the current target in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderDesc {
    pub label: String,
    pub fragment: String,
    pub uniforms: Vec<String>,
    /// Name of the texture uniform bound to unit 1, if the shader samples one.
    pub aux_texture: Option<String>,
}

impl ShaderDesc {
    pub fn new(label: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            fragment: fragment.into(),
            uniforms: Vec::new(),
            aux_texture: None,
        }
    }

    pub fn with_uniform(mut self, name: impl Into<String>) -> Self {
        self.uniforms.push(name.into());
        self
    }

    pub fn with_texture(mut self, name: impl Into<String>) -> Self {
        self.aux_texture = Some(name.into());
        self
    }

    /// Checks what can be checked without a GPU.
    pub fn validate(&self) -> Result<(), RenderError> {
        if !self.fragment.contains("fn fs_main") {
            return Err(RenderError::MissingEntryPoint { label: self.label.clone() });
        }
        if self.uniforms.len() > MAX_SHADER_UNIFORMS {
            return Err(RenderError::TooManyUniforms {
                label: self.label.clone(),
                count: self.uniforms.len(),
                max: MAX_SHADER_UNIFORMS,
            });
        }
        for name in &self.uniforms {
            let mut chars = name.chars();
            let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
                && name != "resolution";
            if !valid {
                return Err(RenderError::InvalidUniformName {
                    label: self.label.clone(),
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// One batch handed to the backend by a flush.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    pub vertices: &'a [Vertex],
    pub blend: BlendMode,
    /// `None` draws untextured (the shader samples white).
    pub texture: Option<TextureId>,
    /// `None` is the default batch shader.
    pub shader: Option<ShaderId>,
    /// Uniform slot values of `shader` at flush time.
    pub uniforms: &'a [[f32; 4]],
    /// Texture bound to unit 1 for `shader`.
    pub aux_texture: Option<TextureId>,
    /// `None` is the screen.
    pub target: Option<TextureId>,
}

/// GPU operations the batch renderer needs.
///
/// All methods are called from the frame thread.
pub trait RenderBackend {
    /// Creates an RGBA8 texture. `rgba.len()` is `width * height * 4`.
    fn create_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> TextureId;

    /// Replaces the contents (and possibly the size) of a texture.
    fn update_texture(&mut self, id: TextureId, width: u32, height: u32, rgba: &[u8]);

    /// Creates a texture that can be drawn into and sampled.
    fn create_render_target(&mut self, width: u32, height: u32) -> TextureId;

    fn destroy_texture(&mut self, id: TextureId);

    fn create_shader(&mut self, desc: &ShaderDesc) -> Result<ShaderId, RenderError>;

    /// Starts a frame; the screen is cleared to `clear`.
    fn begin_frame(&mut self, clear: Color);

    /// Clears `target` (`None` = screen) after everything drawn so far.
    fn clear(&mut self, target: Option<TextureId>, color: Color);

    fn draw(&mut self, call: &DrawCall<'_>);

    /// Submits the frame.
    fn end_frame(&mut self);

    /// Most recent resolved GPU frame time in milliseconds, if a new one is
    /// available. Never blocks.
    fn poll_gpu_time_ms(&mut self) -> Option<f32>;
}

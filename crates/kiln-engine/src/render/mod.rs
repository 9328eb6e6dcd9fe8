//! Batched 2D rendering.
//!
//! [`Renderer`] accumulates transformed vertices and hands them to a
//! [`RenderBackend`] one batch at a time. [`WgpuBackend`] draws them on the
//! GPU; [`HeadlessBackend`] records them.
//!
//! Convention:
//! - CPU geometry is in target pixels (top-left origin, +Y down).
//! - The vertex shader converts to NDC using the target resolution.

pub mod backend;
mod blend;
mod error;
pub mod headless;
mod metrics;
mod renderer;
mod transform;
mod vertex;
mod wgpu_backend;

pub use backend::{DrawCall, RenderBackend, ShaderDesc, ShaderId, TextureId, MAX_SHADER_UNIFORMS};
pub use blend::BlendMode;
pub use error::RenderError;
pub use headless::HeadlessBackend;
pub use metrics::RenderMetrics;
pub use renderer::{
    RenderTarget, Renderer, RendererConfig, Shader, TextureHandle, TextureState, UniformValue,
};
pub use transform::{Transform, TransformStack, MAX_TRANSFORM_STACK_DEPTH};
pub use vertex::{Vertex, VERTEX_FLOATS};
pub use wgpu_backend::{SurfaceSlot, WgpuBackend};

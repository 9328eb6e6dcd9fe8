use bytemuck::{Pod, Zeroable};

use crate::paint::Color;

/// Batch vertex: position in target pixels, straight-alpha color, texture uv.
///
/// Positions are already transformed on the CPU when the vertex is recorded.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 2],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

/// Floats per vertex.
pub const VERTEX_FLOATS: usize = 8;

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x2, // pos
        1 => Float32x4, // color
        2 => Float32x2  // uv
    ];

    #[inline]
    pub const fn new(pos: [f32; 2], color: [f32; 4], uv: [f32; 2]) -> Self {
        Self { pos, color, uv }
    }

    /// Untextured vertex at `(x, y)`.
    #[inline]
    pub fn colored(x: f32, y: f32, color: Color) -> Self {
        Self::new([x, y], color.to_array(), [0.0, 0.0])
    }

    #[inline]
    pub fn textured(x: f32, y: f32, color: Color, u: f32, v: f32) -> Self {
        Self::new([x, y], color.to_array(), [u, v])
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

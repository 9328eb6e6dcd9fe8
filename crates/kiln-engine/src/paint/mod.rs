//! Color model.
//!
//! Colors are straight (non-premultiplied) RGBA floats, matching the vertex
//! format of the batch renderer.

pub mod color;

pub use color::{hex, rgba, rgba255, Color, ColorError};

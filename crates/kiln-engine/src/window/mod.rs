//! Window + runtime loop.
//!
//! Owns the `winit` event loop and the single game window, wires them to the
//! GPU layer and drives the engine once per redraw.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};

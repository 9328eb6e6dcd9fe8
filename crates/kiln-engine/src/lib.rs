//! kiln engine crate.
//!
//! A small 2D engine: batched renderer, tile maps with autotiling, a scene
//! loop with systems, input and an audio mixer contract. The window runtime
//! ties them to `winit` and `wgpu`.

pub mod audio;
pub mod coords;
pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod paint;
pub mod render;
pub mod scene;
pub mod systems;
pub mod tiles;
pub mod time;
pub mod window;

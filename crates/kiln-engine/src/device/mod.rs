//! GPU device + surface management.
//!
//! Creates the wgpu device/queue, configures the window surface and hands
//! out swapchain images. Drawing itself lives in `render::WgpuBackend`.

mod gpu;

pub use gpu::{Gpu, GpuInit, SurfaceErrorAction, SurfaceFrame};

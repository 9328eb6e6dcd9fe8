//! Frame timing.
//!
//! One `FrameClock` per loop; call `tick()` (or `tick_at(now)` when time is
//! supplied from outside) once per frame.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};

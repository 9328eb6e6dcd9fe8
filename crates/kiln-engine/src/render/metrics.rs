/// Per-frame render statistics.
///
/// `gpu_frame_time` comes from a timestamp query and may lag one or more
/// frames behind; it stays at the last known value until a new result lands.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct RenderMetrics {
    /// Milliseconds between `begin_frame` and `end_frame`.
    pub cpu_frame_time: f32,
    /// Milliseconds of GPU work for the most recently resolved frame.
    pub gpu_frame_time: f32,
    pub draw_calls: u32,
    pub triangle_count: u32,
}

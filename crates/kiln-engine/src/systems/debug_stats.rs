use crate::paint::Color;
use crate::render::Renderer;
use crate::scene::System;

/// Logs renderer metrics at debug level and marks the screen corner.
pub struct DebugStats {
    interval: f32,
    since_log: f32,
}

impl Default for DebugStats {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl DebugStats {
    /// Logs at most once per `interval` seconds.
    pub fn new(interval: f32) -> Self {
        Self {
            interval: interval.max(0.0),
            // log on the first rendered frame
            since_log: f32::INFINITY,
        }
    }
}

impl System for DebugStats {
    fn update(&mut self, dt: f32) {
        self.since_log += dt;
    }

    fn render(&mut self, r: &mut Renderer) {
        if self.since_log >= self.interval {
            self.since_log = 0.0;
            let m = r.metrics();
            log::debug!(
                "cpu {:.2} ms, gpu {:.2} ms, {} draw calls, {} triangles",
                m.cpu_frame_time,
                m.gpu_frame_time,
                m.draw_calls,
                m.triangle_count
            );
        }

        r.set_color_value(Color::RED);
        r.draw_rect(4.0, 4.0, 8.0, 8.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::HeadlessBackend;
    use crate::render::RendererConfig;

    #[test]
    fn draws_red_marker() {
        let (backend, log) = HeadlessBackend::with_log();
        let mut r = Renderer::new(Box::new(backend), RendererConfig::default());
        let mut stats = DebugStats::default();

        r.begin_frame(Color::BLACK);
        stats.update(0.016);
        stats.render(&mut r);
        r.end_frame();

        let draws = log.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].vertices.len(), 6);
        assert_eq!(draws[0].vertices[0].pos, [4.0, 4.0]);
        assert_eq!(draws[0].vertices[0].color, Color::RED.to_array());
        assert_eq!(stats.since_log, 0.0);
    }
}

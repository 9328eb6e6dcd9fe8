use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous tick, in seconds, after clamping.
    pub dt: f32,

    /// Timestamp passed to the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// Delta time is clamped so a debugger pause or a minimized window does not
/// turn into one huge simulation step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<Instant>,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub const DEFAULT_DT_MIN: Duration = Duration::from_millis(1);
    pub const DEFAULT_DT_MAX: Duration = Duration::from_millis(100);

    /// Creates a clock clamping dt to `[0.001, 0.1]` seconds.
    pub fn new() -> Self {
        Self::with_clamps(Self::DEFAULT_DT_MIN, Self::DEFAULT_DT_MAX)
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: None,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Forgets the previous tick; the next one reports the minimum dt.
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Advances the clock to `now`.
    ///
    /// The first tick after construction or [`reset`](Self::reset) has no
    /// baseline and reports the minimum dt.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = match self.last {
            Some(last) => now.saturating_duration_since(last).clamp(self.dt_min, self.dt_max),
            None => self.dt_min,
        };
        self.last = Some(now);

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn dt_is_clamped_both_ways() {
        let mut clock = FrameClock::new();
        let t0 = Instant::now();
        assert!(approx(clock.tick_at(t0).dt, 0.001));

        let ft = clock.tick_at(t0 + Duration::from_millis(16));
        assert!(approx(ft.dt, 0.016));

        let ft = clock.tick_at(t0 + Duration::from_millis(16) + Duration::from_secs(3));
        assert!(approx(ft.dt, 0.1));

        // same instant again
        let ft = clock.tick_at(t0 + Duration::from_millis(16) + Duration::from_secs(3));
        assert!(approx(ft.dt, 0.001));
        assert_eq!(ft.frame_index, 3);
    }

    #[test]
    fn time_going_backwards_counts_as_zero() {
        let mut clock = FrameClock::new();
        let t0 = Instant::now() + Duration::from_secs(1);
        clock.tick_at(t0);
        assert!(approx(clock.tick_at(t0 - Duration::from_millis(500)).dt, 0.001));
    }
}

use super::FadeCurve;

/// Floor used by exponential ramps, which cannot pass through zero.
const EXP_FLOOR: f32 = 1e-4;

/// Gain ramp advanced by the mixer's `update(dt)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct Fade {
    from: f32,
    to: f32,
    duration: f32,
    elapsed: f32,
    curve: FadeCurve,
}

impl Fade {
    pub fn new(from: f32, to: f32, duration: f32, curve: FadeCurve) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            elapsed: 0.0,
            curve,
        }
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    /// Advances by `dt` seconds and returns the new value.
    pub fn advance(&mut self, dt: f32) -> f32 {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        self.value()
    }

    pub fn is_done(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn value(&self) -> f32 {
        if self.is_done() {
            return self.to;
        }
        let t = self.elapsed / self.duration;
        match self.curve {
            FadeCurve::Linear => self.from + (self.to - self.from) * t,
            FadeCurve::Exponential => {
                let a = self.from.max(EXP_FLOOR);
                let b = self.to.max(EXP_FLOOR);
                a * (b / a).powf(t)
            }
        }
    }
}

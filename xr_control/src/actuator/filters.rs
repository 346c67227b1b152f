//! First-order low-pass on actuator feedback and output.

use core::f32::consts::TAU;

/// `y += α·(x − y)` with `α = ωdt / (1 + ωdt)`, `ω = 2π·cutoff`.
///
/// A non-positive cutoff disables the filter. The first sample after a reset
/// is taken as-is so a restarted loop does not ramp up from zero.
#[derive(Debug, Clone, Copy)]
pub struct LowPass {
    cutoff_hz: f32,
    state: Option<f32>,
}

impl LowPass {
    pub const fn new(cutoff_hz: f32) -> Self {
        Self {
            cutoff_hz,
            state: None,
        }
    }

    pub fn reset(&mut self) {
        self.state = None;
    }

    pub fn apply(&mut self, input: f32, dt: f32) -> f32 {
        if self.cutoff_hz <= 0.0 || dt <= 0.0 {
            return input;
        }
        let output = match self.state {
            None => input,
            Some(prev) => {
                let w = TAU * self.cutoff_hz * dt;
                prev + w / (1.0 + w) * (input - prev)
            }
        };
        self.state = Some(output);
        output
    }
}

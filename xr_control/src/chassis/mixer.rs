//! Kinematic mixers: chassis motion vector → per-wheel speed fractions.
//!
//! Wheel order is front-left, rear-left, rear-right, front-right. Right-side
//! motors are mounted mirrored, so a pure forward `vx` yields `[+, +, −, −]`.
//! Positive `wz` turns the chassis clockwise seen from above and drives
//! every motor in the same direction.

use core::f32::consts::FRAC_1_SQRT_2;

use xr_common::consts::MAX_WHEELS;
use xr_common::control::config::MixerKind;
use xr_common::control::status::MoveVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mixer {
    Mecanum,
    /// Omni wheels on the corners, at 45° to the chassis axes.
    OmniCross,
    /// Omni wheels front, left, rear and right. Order follows that sequence.
    OmniPlus,
}

impl From<MixerKind> for Mixer {
    fn from(kind: MixerKind) -> Self {
        match kind {
            MixerKind::Mecanum => Self::Mecanum,
            MixerKind::OmniCross => Self::OmniCross,
            MixerKind::OmniPlus => Self::OmniPlus,
        }
    }
}

impl Mixer {
    #[inline]
    pub const fn wheel_count(&self) -> usize {
        MAX_WHEELS
    }

    /// Wheel speed fractions for `v`. If any wheel would exceed 1.0 in
    /// magnitude all wheels are divided by the largest one.
    pub fn apply(&self, v: &MoveVector) -> [f32; MAX_WHEELS] {
        let MoveVector { vx, vy, wz } = *v;
        let mut out = match self {
            Self::Mecanum => [vx - vy + wz, vx + vy + wz, -vx + vy + wz, -vx - vy + wz],
            Self::OmniCross => {
                let k = FRAC_1_SQRT_2;
                [
                    k * (vx - vy) + wz,
                    k * (vx + vy) + wz,
                    k * (-vx + vy) + wz,
                    k * (-vx - vy) + wz,
                ]
            }
            Self::OmniPlus => [-vy + wz, vx + wz, vy + wz, -vx + wz],
        };

        let peak = out.iter().fold(0.0f32, |m, w| m.max(w.abs()));
        if peak > 1.0 {
            for w in out.iter_mut() {
                *w /= peak;
            }
        }
        out
    }
}

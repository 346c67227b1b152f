//! Chassis power model and limiter.
//!
//! Modeled power per motor is
//! `torque·|out|·|rpm| + speed2·rpm² + out2·out²`; the chassis total adds a
//! constant idle term. When the total exceeds the budget every output is
//! multiplied by the same factor `budget / total`, so the ratio between any
//! two wheels (and with it the direction of travel) is unchanged.
//!
//! Only the output-dependent terms shrink with the scale. The `speed2·rpm²`
//! and constant terms follow the measured speed, so the modeled total after
//! scaling can still exceed the budget on a fast-spinning chassis; it drops
//! below budget over the next cycles as the wheels slow down.

use xr_common::control::config::{ChassisConfig, PowerModelConfig};
use xr_common::control::input::{CapInfo, RefereeData};
use xr_common::control::state::PowerMode;

/// Quadratic power model coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerModel {
    pub torque_coeff: f32,
    pub speed2_coeff: f32,
    pub out2_coeff: f32,
    pub constant: f32,
}

impl From<&PowerModelConfig> for PowerModel {
    fn from(c: &PowerModelConfig) -> Self {
        Self {
            torque_coeff: c.torque_coeff,
            speed2_coeff: c.speed2_coeff,
            out2_coeff: c.out2_coeff,
            constant: c.constant,
        }
    }
}

impl PowerModel {
    /// Modeled power of one motor [W].
    #[inline]
    pub fn motor_power(&self, output: f32, speed_rpm: f32) -> f32 {
        self.torque_coeff * output.abs() * speed_rpm.abs()
            + self.speed2_coeff * speed_rpm * speed_rpm
            + self.out2_coeff * output * output
    }

    /// Modeled chassis power including the constant term [W].
    pub fn total(&self, outputs: &[f32], speeds: &[f32]) -> f32 {
        outputs
            .iter()
            .zip(speeds)
            .map(|(&o, &s)| self.motor_power(o, s))
            .sum::<f32>()
            + self.constant
    }
}

/// What the limiter did this cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PowerLimit {
    /// Negative budget: no cap applied.
    Disabled,
    /// Modeled power already within budget; outputs untouched.
    WithinBudget { modeled: f32 },
    /// Outputs multiplied by `scale`.
    Scaled { modeled: f32, scale: f32 },
}

impl PowerLimit {
    /// Modeled power before limiting, if it was computed.
    pub fn modeled(&self) -> Option<f32> {
        match *self {
            Self::Disabled => None,
            Self::WithinBudget { modeled } | Self::Scaled { modeled, .. } => Some(modeled),
        }
    }

    pub fn is_scaled(&self) -> bool {
        matches!(self, Self::Scaled { .. })
    }
}

/// Rescale `outputs` in place so modeled power does not exceed `budget`.
///
/// `speeds` are the measured motor speeds [rpm] paired index-wise with
/// `outputs`. A negative budget disables limiting.
pub fn limit_output_power(
    model: &PowerModel,
    budget: f32,
    outputs: &mut [f32],
    speeds: &[f32],
) -> PowerLimit {
    if budget < 0.0 {
        return PowerLimit::Disabled;
    }

    let modeled = model.total(outputs, speeds);
    if modeled <= budget {
        return PowerLimit::WithinBudget { modeled };
    }

    let scale = budget / modeled;
    for out in outputs.iter_mut() {
        *out *= scale;
    }
    PowerLimit::Scaled { modeled, scale }
}

/// Budget for this cycle [W].
///
/// Energy buffer online in boost → buffer-aware budget; otherwise the
/// referee limit while the link is running; otherwise the fallback constant.
pub fn select_budget(
    config: &ChassisConfig,
    power_mode: PowerMode,
    cap: &CapInfo,
    referee: &RefereeData,
) -> f32 {
    if cap.online && power_mode == PowerMode::Boost {
        config.cap_power_base + config.cap_power_gain * cap.percentage.clamp(0.0, 1.0)
    } else if referee.status.is_running() {
        referee.chassis_power_limit
    } else {
        config.fallback_power_limit
    }
}

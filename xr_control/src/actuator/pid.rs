//! Discrete PID loop used by every actuator.
//!
//! - integral: backward Euler, with back-calculation anti-windup through `tt`
//! - derivative: on the error, smoothed by a first-order filter with time constant `tf`
//! - output: clamped to `±out_limit`
//!
//! Angular loops (`cycle`) wrap the error into `(-π, π]` before any term is
//! computed, so a setpoint across the ±π seam is reached the short way.

use xr_common::control::config::PidParams;

use super::wrap_angle;

#[derive(Debug, Clone)]
pub struct Pid {
    params: PidParams,
    integral: f32,
    /// Error seen on the previous call; `None` right after a reset so the
    /// first call does not differentiate against a stale value.
    last_error: Option<f32>,
    derivative: f32,
    /// `clamped − raw` of the previous output, fed back into the integrator.
    saturation_excess: f32,
}

impl Pid {
    pub fn new(params: &PidParams) -> Self {
        Self {
            params: *params,
            integral: 0.0,
            last_error: None,
            derivative: 0.0,
            saturation_excess: 0.0,
        }
    }

    #[inline]
    pub fn out_limit(&self) -> f32 {
        self.params.out_limit
    }

    #[inline]
    pub fn integral(&self) -> f32 {
        self.integral
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_error = None;
        self.derivative = 0.0;
        self.saturation_excess = 0.0;
    }

    /// Run one step on `setpoint − feedback`. A non-positive `dt` leaves the
    /// state untouched and yields zero.
    pub fn update(&mut self, setpoint: f32, feedback: f32, dt: f32) -> f32 {
        if dt <= 0.0 {
            return 0.0;
        }
        let p = &self.params;
        let error = if p.cycle {
            wrap_angle(setpoint - feedback)
        } else {
            setpoint - feedback
        };

        if p.ki == 0.0 {
            self.integral = 0.0;
        } else {
            let tracking = if p.tt > 0.0 {
                self.saturation_excess / p.tt
            } else {
                0.0
            };
            self.integral += (p.ki * error + tracking) * dt;
        }

        if p.kd == 0.0 {
            self.derivative = 0.0;
        } else if let Some(last) = self.last_error {
            let delta = if p.cycle {
                wrap_angle(error - last)
            } else {
                error - last
            };
            let rate = delta / dt;
            self.derivative = if p.tf > 0.0 {
                self.derivative + dt / (p.tf + dt) * (rate - self.derivative)
            } else {
                rate
            };
        }
        self.last_error = Some(error);

        let raw = p.kp * error + self.integral + p.kd * self.derivative;
        let out = if p.out_limit > 0.0 {
            raw.clamp(-p.out_limit, p.out_limit)
        } else {
            raw
        };
        self.saturation_excess = out - raw;
        out
    }
}

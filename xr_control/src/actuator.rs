//! Resource actuators.
//!
//! An actuator turns a setpoint, measured feedback and elapsed time into a
//! bounded control output. Subsystems own one per motor (plus helper loops
//! such as the chassis acceleration smoothers) and call `reset()` on every
//! mode change so no integrator or filter history leaks across modes.
//!
//! Processing order per call: feedback low-pass → clamped PID → output low-pass.

pub mod filters;
pub mod pid;

use core::f32::consts::{PI, TAU};

use xr_common::control::config::{PositionActuatorParams, SpeedActuatorParams};

use self::filters::LowPass;
use self::pid::Pid;

/// Map an angle [rad] into `(-π, π]`.
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    let mut a = angle % TAU;
    if a > PI {
        a -= TAU;
    } else if a <= -PI {
        a += TAU;
    }
    a
}

// ─── Traits ─────────────────────────────────────────────────────────

/// Single-loop actuator tracking a speed-like quantity.
pub trait SpeedActuator {
    fn calculate(&mut self, setpoint: f32, feedback: f32, dt: f32) -> f32;
    fn reset(&mut self);
}

/// Cascade actuator tracking a position with an inner speed loop.
pub trait PositionActuator {
    fn calculate(&mut self, setpoint: f32, speed_feedback: f32, position_feedback: f32, dt: f32)
    -> f32;
    fn reset(&mut self);
}

// ─── PID Speed Actuator ─────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PidSpeedActuator {
    pid: Pid,
    in_filter: LowPass,
    out_filter: LowPass,
}

impl PidSpeedActuator {
    pub fn new(params: &SpeedActuatorParams) -> Self {
        Self {
            pid: Pid::new(&params.speed),
            in_filter: LowPass::new(params.in_cutoff_hz),
            out_filter: LowPass::new(params.out_cutoff_hz),
        }
    }

    #[inline]
    pub fn out_limit(&self) -> f32 {
        self.pid.out_limit()
    }
}

impl SpeedActuator for PidSpeedActuator {
    fn calculate(&mut self, setpoint: f32, feedback: f32, dt: f32) -> f32 {
        let feedback = self.in_filter.apply(feedback, dt);
        let out = self.pid.update(setpoint, feedback, dt);
        self.out_filter.apply(out, dt)
    }

    fn reset(&mut self) {
        self.pid.reset();
        self.in_filter.reset();
        self.out_filter.reset();
    }
}

// ─── Cascade Position Actuator ──────────────────────────────────────

/// Outer position loop producing the speed setpoint of an inner speed loop.
/// The feedback filter sits on the speed measurement only.
#[derive(Debug, Clone)]
pub struct CascadePositionActuator {
    position: Pid,
    speed: Pid,
    in_filter: LowPass,
    out_filter: LowPass,
}

impl CascadePositionActuator {
    pub fn new(params: &PositionActuatorParams) -> Self {
        Self {
            position: Pid::new(&params.position),
            speed: Pid::new(&params.speed),
            in_filter: LowPass::new(params.in_cutoff_hz),
            out_filter: LowPass::new(params.out_cutoff_hz),
        }
    }
}

impl PositionActuator for CascadePositionActuator {
    fn calculate(
        &mut self,
        setpoint: f32,
        speed_feedback: f32,
        position_feedback: f32,
        dt: f32,
    ) -> f32 {
        let speed_setpoint = self.position.update(setpoint, position_feedback, dt);
        let speed_feedback = self.in_filter.apply(speed_feedback, dt);
        let out = self.speed.update(speed_setpoint, speed_feedback, dt);
        self.out_filter.apply(out, dt)
    }

    fn reset(&mut self) {
        self.position.reset();
        self.speed.reset();
        self.in_filter.reset();
        self.out_filter.reset();
    }
}

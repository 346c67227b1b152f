//! Simulated motor.
//!
//! First-order speed response to the commanded output, integrated shaft
//! angle, and a jam switch that holds the shaft still. Every `update()`
//! advances the model by one fixed step so runs are reproducible.

use core::f32::consts::TAU;

use tracing::trace;

use crate::motor::Motor;

/// Motor model parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimMotorParams {
    /// Steady-state speed at output 1.0 [rpm].
    pub rpm_per_output: f32,
    /// Speed response time constant [s].
    pub time_constant_s: f32,
}

impl SimMotorParams {
    /// Chassis wheel motor.
    pub const M3508: Self = Self {
        rpm_per_output: 9600.0,
        time_constant_s: 0.05,
    };
    /// Feed motor.
    pub const M2006: Self = Self {
        rpm_per_output: 12_000.0,
        time_constant_s: 0.02,
    };
    /// Gimbal motor.
    pub const GM6020: Self = Self {
        rpm_per_output: 320.0,
        time_constant_s: 0.03,
    };
}

#[derive(Debug, Clone)]
pub struct SimMotor {
    name: &'static str,
    params: SimMotorParams,
    step_s: f32,
    speed_rpm: f32,
    /// Continuous shaft angle [rad].
    shaft: f32,
    output: f32,
    relaxed: bool,
    jammed: bool,
    measured_speed: f32,
    measured_angle: f32,
}

impl SimMotor {
    pub fn new(name: &'static str, params: SimMotorParams, step_s: f32) -> Self {
        Self {
            name,
            params,
            step_s,
            speed_rpm: 0.0,
            shaft: 0.0,
            output: 0.0,
            relaxed: true,
            jammed: false,
            measured_speed: 0.0,
            measured_angle: 0.0,
        }
    }

    /// Hold the shaft still regardless of output.
    pub fn set_jammed(&mut self, jammed: bool) {
        self.jammed = jammed;
        if jammed {
            self.speed_rpm = 0.0;
        }
    }

    pub fn is_jammed(&self) -> bool {
        self.jammed
    }

    pub fn is_relaxed(&self) -> bool {
        self.relaxed
    }

    /// Last commanded output.
    pub fn output(&self) -> f32 {
        self.output
    }

    /// Continuous (unwrapped) shaft angle [rad].
    pub fn shaft_angle(&self) -> f32 {
        self.shaft
    }

    /// Move the shaft directly, as an external load would.
    pub fn set_shaft_angle(&mut self, angle: f32) {
        self.shaft = angle;
    }

    fn advance(&mut self) {
        if self.jammed {
            self.speed_rpm = 0.0;
            return;
        }
        let target = if self.relaxed {
            0.0
        } else {
            self.output * self.params.rpm_per_output
        };
        let alpha = if self.params.time_constant_s > 0.0 {
            (self.step_s / self.params.time_constant_s).min(1.0)
        } else {
            1.0
        };
        self.speed_rpm += alpha * (target - self.speed_rpm);
        self.shaft += self.speed_rpm / 60.0 * TAU * self.step_s;
    }
}

impl Motor for SimMotor {
    fn update(&mut self) {
        self.advance();
        self.measured_speed = self.speed_rpm;
        self.measured_angle = self.shaft.rem_euclid(TAU);
    }

    fn speed(&self) -> f32 {
        self.measured_speed
    }

    fn angle(&self) -> f32 {
        self.measured_angle
    }

    fn control(&mut self, output: f32) {
        self.output = output.clamp(-1.0, 1.0);
        self.relaxed = false;
    }

    fn relax(&mut self) {
        if !self.relaxed {
            trace!(motor = self.name, "relaxed");
        }
        self.output = 0.0;
        self.relaxed = true;
    }
}

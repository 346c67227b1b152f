//! Configuration structures for the actuated subsystems.
//!
//! All config types use `serde::Deserialize` for TOML loading. Every numeric
//! field has a serde default so a partial file (or none at all) yields a
//! working infantry robot. `validate()` returns a human-readable reason;
//! loaders wrap it into `ConfigError::ValidationError`.

use serde::{Deserialize, Serialize};

use std::path::Path;

use crate::config::{ConfigError, ConfigLoader, SharedConfig};
use crate::consts::{
    CYCLE_TIME_US, CYCLE_TIME_US_MAX, CYCLE_TIME_US_MIN, FALLBACK_SHOTS, MAX_FRIC_WHEELS,
};

// ─── Top-Level Config ───────────────────────────────────────────────

/// Complete robot configuration document.
///
/// ```toml
/// [shared]
/// service_name = "infantry-03"
///
/// [control]
/// cycle_time_us = 2000
///
/// [chassis]
/// mixer = "mecanum"
///
/// [launcher]
/// num_trig_tooth = 8
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RobotConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub chassis: ChassisConfig,
    #[serde(default)]
    pub launcher: LauncherConfig,
    #[serde(default)]
    pub gimbal: GimbalConfig,
}

impl RobotConfig {
    /// Validate every section. Errors are prefixed with the table name.
    pub fn validate(&self) -> Result<(), String> {
        self.shared.validate().map_err(|e| format!("[shared] {e}"))?;
        self.control.validate().map_err(|e| format!("[control] {e}"))?;
        self.chassis.validate().map_err(|e| format!("[chassis] {e}"))?;
        self.launcher.validate().map_err(|e| format!("[launcher] {e}"))?;
        self.gimbal.validate().map_err(|e| format!("[gimbal] {e}"))?;
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config = Self::load_str(text)?;
        config.validate().map_err(ConfigError::ValidationError)?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load_validated(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate().map_err(ConfigError::ValidationError)?;
        Ok(config)
    }
}

// ─── Scheduler ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Control tick period in microseconds (default: 2000 = 2 ms).
    #[serde(default = "default_cycle_time_us")]
    pub cycle_time_us: u32,
}

fn default_cycle_time_us() -> u32 {
    CYCLE_TIME_US
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            cycle_time_us: CYCLE_TIME_US,
        }
    }
}

impl ControlConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.cycle_time_us < CYCLE_TIME_US_MIN || self.cycle_time_us > CYCLE_TIME_US_MAX {
            return Err(format!(
                "cycle_time_us {} out of range [{}, {}]",
                self.cycle_time_us, CYCLE_TIME_US_MIN, CYCLE_TIME_US_MAX
            ));
        }
        Ok(())
    }

    /// Cycle period in seconds.
    #[inline]
    pub fn period_s(&self) -> f32 {
        self.cycle_time_us as f32 * 1e-6
    }
}

// ─── Actuator Parameters ────────────────────────────────────────────

/// PID gains.
///
/// Zero `ki` disables the integral, zero `kd` the derivative. With `cycle`
/// set the error is wrapped into `(-π, π]` before use, for angular loops.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidParams {
    #[serde(default)]
    pub kp: f32,
    #[serde(default)]
    pub ki: f32,
    #[serde(default)]
    pub kd: f32,
    /// Derivative filter time constant [s] (0 = unfiltered).
    #[serde(default)]
    pub tf: f32,
    /// Anti-windup tracking time constant [s] (0 = disabled).
    #[serde(default)]
    pub tt: f32,
    /// Output saturation limit.
    #[serde(default = "default_out_limit")]
    pub out_limit: f32,
    #[serde(default)]
    pub cycle: bool,
}

fn default_out_limit() -> f32 {
    1.0
}

impl PidParams {
    pub const fn p(kp: f32, out_limit: f32) -> Self {
        Self {
            kp,
            ki: 0.0,
            kd: 0.0,
            tf: 0.0,
            tt: 0.0,
            out_limit,
            cycle: false,
        }
    }

    pub const fn pi(kp: f32, ki: f32, out_limit: f32) -> Self {
        Self {
            ki,
            tt: 0.05,
            ..Self::p(kp, out_limit)
        }
    }

    pub const fn cyclic(self) -> Self {
        Self {
            cycle: true,
            ..self
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let finite = [self.kp, self.ki, self.kd, self.tf, self.tt, self.out_limit]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err("PID gains must be finite".to_string());
        }
        if self.out_limit <= 0.0 {
            return Err(format!("out_limit {} must be > 0", self.out_limit));
        }
        if self.tf < 0.0 || self.tt < 0.0 {
            return Err("tf and tt must be >= 0".to_string());
        }
        Ok(())
    }
}

impl Default for PidParams {
    fn default() -> Self {
        Self::p(1.0, 1.0)
    }
}

/// Speed actuator: one PID plus optional first-order filters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedActuatorParams {
    #[serde(default)]
    pub speed: PidParams,
    /// Feedback low-pass cutoff [Hz] (0 = disabled).
    #[serde(default)]
    pub in_cutoff_hz: f32,
    /// Output low-pass cutoff [Hz] (0 = disabled).
    #[serde(default)]
    pub out_cutoff_hz: f32,
}

impl SpeedActuatorParams {
    pub const fn from_pid(speed: PidParams) -> Self {
        Self {
            speed,
            in_cutoff_hz: 0.0,
            out_cutoff_hz: 0.0,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.speed.validate()?;
        if self.in_cutoff_hz < 0.0 || self.out_cutoff_hz < 0.0 {
            return Err("filter cutoffs must be >= 0".to_string());
        }
        Ok(())
    }
}

impl Default for SpeedActuatorParams {
    fn default() -> Self {
        Self::from_pid(PidParams::default())
    }
}

/// Cascade actuator: outer position PID feeding an inner speed PID.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionActuatorParams {
    #[serde(default)]
    pub position: PidParams,
    #[serde(default)]
    pub speed: PidParams,
    #[serde(default)]
    pub in_cutoff_hz: f32,
    #[serde(default)]
    pub out_cutoff_hz: f32,
}

impl PositionActuatorParams {
    pub const fn new(position: PidParams, speed: PidParams) -> Self {
        Self {
            position,
            speed,
            in_cutoff_hz: 0.0,
            out_cutoff_hz: 0.0,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.position.validate().map_err(|e| format!("position: {e}"))?;
        self.speed.validate().map_err(|e| format!("speed: {e}"))?;
        if self.in_cutoff_hz < 0.0 || self.out_cutoff_hz < 0.0 {
            return Err("filter cutoffs must be >= 0".to_string());
        }
        Ok(())
    }
}

impl Default for PositionActuatorParams {
    fn default() -> Self {
        Self::new(PidParams::p(1.0, 1.0).cyclic(), PidParams::p(1.0, 1.0))
    }
}

// ─── Chassis ────────────────────────────────────────────────────────

/// Wheel geometry used by the kinematic mixer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixerKind {
    #[default]
    Mecanum,
    /// Omni wheels at 45° to the chassis axes.
    OmniCross,
    /// Omni wheels on the chassis axes.
    OmniPlus,
}

/// Quadratic chassis power model.
///
/// `P = Σ (torque·|out|·|rpm| + speed2·rpm² + out2·out²) + constant`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerModelConfig {
    #[serde(default = "default_torque_coeff")]
    pub torque_coeff: f32,
    #[serde(default = "default_speed2_coeff")]
    pub speed2_coeff: f32,
    #[serde(default = "default_out2_coeff")]
    pub out2_coeff: f32,
    #[serde(default = "default_power_constant")]
    pub constant: f32,
}

fn default_torque_coeff() -> f32 {
    0.032_717_046
}
fn default_speed2_coeff() -> f32 {
    2.187_847_8e-7
}
fn default_out2_coeff() -> f32 {
    74.328_93
}
fn default_power_constant() -> f32 {
    1.902_146_4
}

impl Default for PowerModelConfig {
    fn default() -> Self {
        Self {
            torque_coeff: default_torque_coeff(),
            speed2_coeff: default_speed2_coeff(),
            out2_coeff: default_out2_coeff(),
            constant: default_power_constant(),
        }
    }
}

impl PowerModelConfig {
    pub fn validate(&self) -> Result<(), String> {
        let coeffs = [self.torque_coeff, self.speed2_coeff, self.out2_coeff, self.constant];
        if coeffs.iter().any(|c| !c.is_finite() || *c < 0.0) {
            return Err("power model coefficients must be finite and >= 0".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChassisConfig {
    #[serde(default)]
    pub mixer: MixerKind,
    #[serde(default)]
    pub power: PowerModelConfig,

    /// Budget while the referee link is down [W]. Negative disables limiting.
    #[serde(default = "default_fallback_power_limit")]
    pub fallback_power_limit: f32,
    /// Energy-buffer budget: `cap_power_base + cap_power_gain · percentage` [W].
    #[serde(default = "default_cap_power_base")]
    pub cap_power_base: f32,
    #[serde(default = "default_cap_power_gain")]
    pub cap_power_gain: f32,

    /// Constant spin rate in ROTOR mode.
    #[serde(default = "default_rotor_wz")]
    pub rotor_wz: f32,
    /// Use the time-varying spin rate instead of `rotor_wz`.
    #[serde(default)]
    pub rotor_varying: bool,
    #[serde(default = "default_rotor_wz_min")]
    pub rotor_wz_min: f32,
    #[serde(default = "default_rotor_wz_max")]
    pub rotor_wz_max: f32,
    /// Angular frequency of the varying spin [rad/ms].
    #[serde(default = "default_rotor_omega")]
    pub rotor_omega: f32,
    /// Heading offset applied to the frame rotation in ROTOR mode [rad].
    #[serde(default)]
    pub rotor_heading_offset: f32,

    #[serde(default = "default_wheel_actuator")]
    pub wheel: SpeedActuatorParams,
    #[serde(default = "default_follow_pid")]
    pub follow: SpeedActuatorParams,
    #[serde(default = "default_xaccl_pid")]
    pub xaccl: SpeedActuatorParams,
    #[serde(default = "default_yaccl_pid")]
    pub yaccl: SpeedActuatorParams,
}

fn default_fallback_power_limit() -> f32 {
    80.0
}
fn default_cap_power_base() -> f32 {
    100.0
}
fn default_cap_power_gain() -> f32 {
    20.0
}
fn default_rotor_wz() -> f32 {
    1.0
}
fn default_rotor_wz_min() -> f32 {
    0.8
}
fn default_rotor_wz_max() -> f32 {
    1.0
}
fn default_rotor_omega() -> f32 {
    0.0025
}
fn default_wheel_actuator() -> SpeedActuatorParams {
    SpeedActuatorParams::from_pid(PidParams::p(0.000_16, 1.0))
}
fn default_follow_pid() -> SpeedActuatorParams {
    SpeedActuatorParams::from_pid(PidParams::p(2.5, 1.0).cyclic())
}
fn default_xaccl_pid() -> SpeedActuatorParams {
    SpeedActuatorParams::from_pid(PidParams::pi(0.32, 0.64, 1.0))
}
fn default_yaccl_pid() -> SpeedActuatorParams {
    SpeedActuatorParams::from_pid(PidParams::pi(0.6, 1.6, 1.0))
}

impl Default for ChassisConfig {
    fn default() -> Self {
        Self {
            mixer: MixerKind::default(),
            power: PowerModelConfig::default(),
            fallback_power_limit: default_fallback_power_limit(),
            cap_power_base: default_cap_power_base(),
            cap_power_gain: default_cap_power_gain(),
            rotor_wz: default_rotor_wz(),
            rotor_varying: false,
            rotor_wz_min: default_rotor_wz_min(),
            rotor_wz_max: default_rotor_wz_max(),
            rotor_omega: default_rotor_omega(),
            rotor_heading_offset: 0.0,
            wheel: default_wheel_actuator(),
            follow: default_follow_pid(),
            xaccl: default_xaccl_pid(),
            yaccl: default_yaccl_pid(),
        }
    }
}

impl ChassisConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.power.validate()?;
        if !(0.0..=1.0).contains(&self.rotor_wz) {
            return Err(format!("rotor_wz {} out of range [0, 1]", self.rotor_wz));
        }
        if self.rotor_wz_min < 0.0 || self.rotor_wz_min > self.rotor_wz_max || self.rotor_wz_max > 1.0
        {
            return Err(format!(
                "rotor spin bounds [{}, {}] must satisfy 0 <= min <= max <= 1",
                self.rotor_wz_min, self.rotor_wz_max
            ));
        }
        if self.cap_power_base < 0.0 || self.cap_power_gain < 0.0 {
            return Err("energy-buffer budget terms must be >= 0".to_string());
        }
        self.wheel.validate().map_err(|e| format!("wheel: {e}"))?;
        self.follow.validate().map_err(|e| format!("follow: {e}"))?;
        self.xaccl.validate().map_err(|e| format!("xaccl: {e}"))?;
        self.yaccl.validate().map_err(|e| format!("yaccl: {e}"))?;
        Ok(())
    }
}

// ─── Launcher ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LauncherConfig {
    /// Teeth on the feed wheel; one tooth pitch releases one projectile.
    #[serde(default = "default_num_trig_tooth")]
    pub num_trig_tooth: u32,
    /// Feed motor shaft turns per feed-wheel turn.
    #[serde(default = "default_trig_gear_ratio")]
    pub trig_gear_ratio: f32,
    /// Minimum delay between feed steps [ms].
    #[serde(default = "default_min_launch_delay_ms")]
    pub min_launch_delay_ms: u32,
    /// Whether the feed wheel may step backwards to clear a jam.
    #[serde(default = "default_allow_reverse")]
    pub allow_reverse: bool,
    /// Projectiles per rising edge in BURST mode.
    #[serde(default = "default_burst_count")]
    pub burst_count: u32,
    /// Heat added per projectile.
    #[serde(default = "default_heat_increase")]
    pub heat_increase: f32,
    /// Shot allowance while the referee link is down.
    #[serde(default = "default_fallback_shots")]
    pub fallback_shots: u32,
    /// Friction-wheel speed setpoints in LOADED [rpm], signed per wheel.
    #[serde(default = "default_fric_rpm")]
    pub fric_rpm: [f32; MAX_FRIC_WHEELS],

    #[serde(default = "default_trig_actuator")]
    pub trig: PositionActuatorParams,
    #[serde(default = "default_fric_actuator")]
    pub fric: SpeedActuatorParams,
}

fn default_num_trig_tooth() -> u32 {
    8
}
fn default_trig_gear_ratio() -> f32 {
    36.0
}
fn default_min_launch_delay_ms() -> u32 {
    50
}
fn default_allow_reverse() -> bool {
    true
}
fn default_burst_count() -> u32 {
    5
}
fn default_heat_increase() -> f32 {
    10.0
}
fn default_fallback_shots() -> u32 {
    FALLBACK_SHOTS
}
fn default_fric_rpm() -> [f32; MAX_FRIC_WHEELS] {
    [-6500.0, 6500.0]
}
fn default_trig_actuator() -> PositionActuatorParams {
    PositionActuatorParams::new(PidParams::p(1.52, 2.0).cyclic(), PidParams::p(8.8, 1.0))
}
fn default_fric_actuator() -> SpeedActuatorParams {
    SpeedActuatorParams::from_pid(PidParams::p(0.0015, 1.0))
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            num_trig_tooth: default_num_trig_tooth(),
            trig_gear_ratio: default_trig_gear_ratio(),
            min_launch_delay_ms: default_min_launch_delay_ms(),
            allow_reverse: default_allow_reverse(),
            burst_count: default_burst_count(),
            heat_increase: default_heat_increase(),
            fallback_shots: default_fallback_shots(),
            fric_rpm: default_fric_rpm(),
            trig: default_trig_actuator(),
            fric: default_fric_actuator(),
        }
    }
}

impl LauncherConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.num_trig_tooth == 0 {
            return Err("num_trig_tooth must be > 0".to_string());
        }
        if !self.trig_gear_ratio.is_finite() || self.trig_gear_ratio <= 0.0 {
            return Err(format!("trig_gear_ratio {} must be > 0", self.trig_gear_ratio));
        }
        if !self.heat_increase.is_finite() || self.heat_increase <= 0.0 {
            return Err(format!("heat_increase {} must be > 0", self.heat_increase));
        }
        if self.burst_count == 0 {
            return Err("burst_count must be > 0".to_string());
        }
        if self.fric_rpm.iter().any(|v| !v.is_finite()) {
            return Err("fric_rpm must be finite".to_string());
        }
        self.trig.validate().map_err(|e| format!("trig: {e}"))?;
        self.fric.validate().map_err(|e| format!("fric: {e}"))?;
        Ok(())
    }

    /// Feed-wheel angle per projectile [rad].
    #[inline]
    pub fn trig_step(&self) -> f32 {
        core::f32::consts::TAU / self.num_trig_tooth as f32
    }
}

// ─── Gimbal ─────────────────────────────────────────────────────────

/// Soft travel limit of one axis [rad, encoder angle relative to the
/// mechanical zero]. Disabled when `max == min`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisLimit {
    #[serde(default)]
    pub min: f32,
    #[serde(default)]
    pub max: f32,
}

impl AxisLimit {
    #[inline]
    pub fn enabled(&self) -> bool {
        self.max != self.min
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GimbalConfig {
    #[serde(default = "default_yaw_actuator")]
    pub yaw: PositionActuatorParams,
    #[serde(default = "default_pit_actuator")]
    pub pit: PositionActuatorParams,
    #[serde(default = "default_yaw_actuator")]
    pub yaw_ai: PositionActuatorParams,
    #[serde(default = "default_pit_actuator")]
    pub pit_ai: PositionActuatorParams,
    /// Encoder angle at which the gimbal faces the chassis front [rad].
    #[serde(default)]
    pub yaw_mech_zero: f32,
    #[serde(default)]
    pub pit_mech_zero: f32,
    #[serde(default)]
    pub yaw_limit: AxisLimit,
    #[serde(default = "default_pit_limit")]
    pub pit_limit: AxisLimit,
}

fn default_yaw_actuator() -> PositionActuatorParams {
    PositionActuatorParams::new(PidParams::p(20.0, 15.0).cyclic(), PidParams::pi(3.2, 2.0, 2.0))
}
fn default_pit_actuator() -> PositionActuatorParams {
    PositionActuatorParams::new(PidParams::p(20.0, 10.0).cyclic(), PidParams::pi(1.2, 0.48, 1.0))
}
fn default_pit_limit() -> AxisLimit {
    AxisLimit {
        min: -0.45,
        max: 0.35,
    }
}

impl Default for GimbalConfig {
    fn default() -> Self {
        Self {
            yaw: default_yaw_actuator(),
            pit: default_pit_actuator(),
            yaw_ai: default_yaw_actuator(),
            pit_ai: default_pit_actuator(),
            yaw_mech_zero: 0.0,
            pit_mech_zero: 0.0,
            yaw_limit: AxisLimit::default(),
            pit_limit: default_pit_limit(),
        }
    }
}

impl GimbalConfig {
    pub fn validate(&self) -> Result<(), String> {
        for (name, limit) in [("yaw_limit", self.yaw_limit), ("pit_limit", self.pit_limit)] {
            if limit.min > limit.max {
                return Err(format!("{name}: min {} > max {}", limit.min, limit.max));
            }
        }
        self.yaw.validate().map_err(|e| format!("yaw: {e}"))?;
        self.pit.validate().map_err(|e| format!("pit: {e}"))?;
        self.yaw_ai.validate().map_err(|e| format!("yaw_ai: {e}"))?;
        self.pit_ai.validate().map_err(|e| format!("pit_ai: {e}"))?;
        Ok(())
    }
}

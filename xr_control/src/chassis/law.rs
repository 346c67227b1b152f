//! Per-mode chassis motion laws.
//!
//! Each chassis mode has one [`MotionLaw`] that turns the operator command,
//! the chassis heading and the previous motion vector into this cycle's
//! [`MoveVector`]. Laws are stateless unit structs; everything that persists
//! between cycles lives in [`MotionLoops`] owned by the chassis.

use xr_common::control::config::ChassisConfig;
use xr_common::control::input::ChassisCommand;
use xr_common::control::state::ChassisMode;
use xr_common::control::status::MoveVector;

use crate::actuator::{PidSpeedActuator, SpeedActuator};

/// Mixer saturation threshold on `|vx| + |vy| + |wz|`.
pub const SATURATION_L1: f32 = 1.0;

/// Inputs for one evaluation of a motion law.
#[derive(Debug, Clone, Copy)]
pub struct MotionContext<'a> {
    pub config: &'a ChassisConfig,
    pub cmd: ChassisCommand,
    /// Gimbal yaw relative to the chassis [rad].
    pub yaw: f32,
    pub now_ms: u32,
    pub dt: f32,
    /// Spin direction drawn on entering ROTOR, `-1.0` or `1.0`.
    pub spin_dir: f32,
    /// Motion vector of the previous cycle.
    pub prev: MoveVector,
}

/// Closed loops used by the motion laws.
#[derive(Debug, Clone)]
pub struct MotionLoops {
    pub follow: PidSpeedActuator,
    pub xaccl: PidSpeedActuator,
    pub yaccl: PidSpeedActuator,
}

impl MotionLoops {
    pub fn new(config: &ChassisConfig) -> Self {
        Self {
            follow: PidSpeedActuator::new(&config.follow),
            xaccl: PidSpeedActuator::new(&config.xaccl),
            yaccl: PidSpeedActuator::new(&config.yaccl),
        }
    }

    pub fn reset(&mut self) {
        self.follow.reset();
        self.xaccl.reset();
        self.yaccl.reset();
    }
}

pub trait MotionLaw: Sync {
    fn compute(&self, ctx: &MotionContext<'_>, loops: &mut MotionLoops) -> MoveVector;
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Rotate `(x, y)` by `angle` [rad].
#[inline]
pub fn rotate(x: f32, y: f32, angle: f32) -> (f32, f32) {
    let (sin, cos) = angle.sin_cos();
    (cos * x - sin * y, sin * x + cos * y)
}

/// Uniformly rescale so `|vx| + |vy| + |wz| <= 1`.
///
/// Signs and ratios between components are unchanged.
pub fn saturate_l1(v: MoveVector) -> MoveVector {
    let sum = v.l1();
    if sum > SATURATION_L1 {
        MoveVector::new(v.vx / sum, v.vy / sum, v.wz / sum)
    } else {
        v
    }
}

/// Spin rate magnitude for ROTOR.
pub fn spin_rate(config: &ChassisConfig, now_ms: u32) -> f32 {
    if !config.rotor_varying {
        return config.rotor_wz;
    }
    let lo = config.rotor_wz_min;
    let hi = config.rotor_wz_max;
    let wave = (0.2 * (config.rotor_omega * now_ms as f32).sin()).abs();
    (wave + lo).clamp(lo, hi)
}

/// Frame rotation followed by the per-axis acceleration loops.
///
/// A loop is reset whenever its command axis is exactly zero so a released
/// stick does not leave integrator charge behind.
fn smoothed_translation(ctx: &MotionContext<'_>, loops: &mut MotionLoops) -> (f32, f32) {
    let (x, y) = rotate(ctx.cmd.x, ctx.cmd.y, ctx.yaw);

    let vx = loops.xaccl.calculate(x, ctx.prev.vx, ctx.dt);
    if ctx.cmd.x == 0.0 {
        loops.xaccl.reset();
    }
    let vy = loops.yaccl.calculate(y, ctx.prev.vy, ctx.dt);
    if ctx.cmd.y == 0.0 {
        loops.yaccl.reset();
    }

    let sum = vx.abs() + vy.abs();
    if sum > SATURATION_L1 {
        (vx / sum, vy / sum)
    } else {
        (vx, vy)
    }
}

// ─── Laws ───────────────────────────────────────────────────────────

/// Motors released; translation loops keep tracking the command.
pub struct Relax;
/// Translation stopped, rotation passed through.
pub struct Break;
/// Translation in the gimbal frame, heading locked to the gimbal.
pub struct Follow;
/// Translation in the gimbal frame while spinning.
pub struct Rotor;
/// Command used as-is in the chassis frame.
pub struct Independent;

impl MotionLaw for Relax {
    fn compute(&self, ctx: &MotionContext<'_>, loops: &mut MotionLoops) -> MoveVector {
        let (vx, vy) = smoothed_translation(ctx, loops);
        MoveVector::new(vx, vy, ctx.cmd.z)
    }
}

impl MotionLaw for Break {
    fn compute(&self, ctx: &MotionContext<'_>, _loops: &mut MotionLoops) -> MoveVector {
        MoveVector::new(0.0, 0.0, ctx.cmd.z)
    }
}

impl MotionLaw for Follow {
    fn compute(&self, ctx: &MotionContext<'_>, loops: &mut MotionLoops) -> MoveVector {
        let (vx, vy) = smoothed_translation(ctx, loops);
        let wz = loops.follow.calculate(0.0, ctx.yaw, ctx.dt).clamp(-1.0, 1.0);
        saturate_l1(MoveVector::new(vx, vy, wz))
    }
}

impl MotionLaw for Rotor {
    fn compute(&self, ctx: &MotionContext<'_>, _loops: &mut MotionLoops) -> MoveVector {
        let heading = ctx.yaw + ctx.config.rotor_heading_offset;
        let (vx, vy) = rotate(ctx.cmd.x, ctx.cmd.y, heading);
        let wz = ctx.spin_dir * spin_rate(ctx.config, ctx.now_ms);
        saturate_l1(MoveVector::new(vx, vy, wz))
    }
}

impl MotionLaw for Independent {
    fn compute(&self, ctx: &MotionContext<'_>, _loops: &mut MotionLoops) -> MoveVector {
        MoveVector::new(ctx.cmd.x, ctx.cmd.y, ctx.cmd.z)
    }
}

/// Motion law for `mode`.
pub fn law_for(mode: ChassisMode) -> &'static dyn MotionLaw {
    match mode {
        ChassisMode::Relax => &Relax,
        ChassisMode::Break => &Break,
        ChassisMode::Follow => &Follow,
        ChassisMode::Rotor => &Rotor,
        ChassisMode::Independent => &Independent,
    }
}

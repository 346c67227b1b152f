//! Published status records and condition flags.
//!
//! Every abnormal runtime condition of the core is represented as state in
//! these records rather than surfaced as an error: a jam, heat exhaustion or
//! an active power cap is a flag that the next control cycle resolves.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::state::{ChassisMode, FireMode, GimbalMode, PowerMode, TrigMode};
use crate::consts::{MAX_FRIC_WHEELS, MAX_WHEELS};

// ─── Flags ──────────────────────────────────────────────────────────

bitflags! {
    /// Chassis condition flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ChassisFlags: u8 {
        /// Outputs were rescaled by the power limiter this cycle.
        const POWER_LIMITED   = 0x01;
        /// Energy buffer reported online.
        const CAP_ONLINE      = 0x02;
        /// Referee link not running, fallback budget in use.
        const REFEREE_OFFLINE = 0x04;
    }
}

bitflags! {
    /// Launcher condition flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct LauncherFlags: u8 {
        /// Last feed attempt travelled less than expected.
        const JAMMED          = 0x01;
        /// No shots available under the heat budget.
        const HEAT_LOCKED     = 0x02;
        /// Referee link not running, fallback shot allowance in use.
        const REFEREE_OFFLINE = 0x04;
        /// Feed setpoint currently stepped backwards to clear a jam.
        const FEED_REVERSING  = 0x08;
    }
}

impl LauncherFlags {
    /// Conditions that prevent a new burst from being armed.
    pub const ARM_BLOCKING: Self = Self::from_bits_truncate(Self::HEAT_LOCKED.bits());

    #[inline]
    pub const fn blocks_arming(&self) -> bool {
        self.intersects(Self::ARM_BLOCKING)
    }
}

// ─── Feed ───────────────────────────────────────────────────────────

/// Outcome of one feed-mechanism step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum FeedAction {
    /// Delay not elapsed or nothing to launch.
    #[default]
    Hold = 0,
    /// Normal forward step, one projectile released.
    Advance = 1,
    /// Jam detected, setpoint stepped backwards.
    Reverse = 2,
    /// Jam detected after a reverse, forward step re-attempted.
    Retry = 3,
    /// Jam detected and reversing is not allowed.
    Blocked = 4,
}

impl FeedAction {
    #[inline]
    pub const fn is_jam(self) -> bool {
        matches!(self, Self::Reverse | Self::Retry | Self::Blocked)
    }
}

// ─── Records ────────────────────────────────────────────────────────

/// Chassis motion vector after the mode law, each component nominally in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MoveVector {
    pub vx: f32,
    pub vy: f32,
    pub wz: f32,
}

impl MoveVector {
    #[inline]
    pub const fn new(vx: f32, vy: f32, wz: f32) -> Self {
        Self { vx, vy, wz }
    }

    /// `|vx| + |vy| + |wz|`.
    #[inline]
    pub fn l1(&self) -> f32 {
        self.vx.abs() + self.vy.abs() + self.wz.abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChassisStatus {
    pub mode: ChassisMode,
    pub power_mode: PowerMode,
    /// Heading of the chassis relative to the gimbal [rad].
    pub yaw: f32,
    pub move_vec: MoveVector,
    pub wheel_out: [f32; MAX_WHEELS],
    /// Modeled electrical power before limiting [W].
    pub modeled_power: f32,
    /// Budget applied this cycle [W], negative when limiting is disabled.
    pub power_budget: f32,
    pub flags: ChassisFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LauncherStatus {
    pub fire_mode: FireMode,
    pub trig_mode: TrigMode,
    pub available_shots: u32,
    pub launched: u32,
    pub to_launch: u32,
    pub trig_setpoint: f32,
    pub trig_angle: f32,
    pub fric_speed: [f32; MAX_FRIC_WHEELS],
    pub last_action: FeedAction,
    pub flags: LauncherFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GimbalStatus {
    pub mode: GimbalMode,
    pub setpoint_yaw: f32,
    pub setpoint_pit: f32,
    /// Yaw encoder angle minus mechanical zero [rad].
    pub relative_yaw: f32,
}

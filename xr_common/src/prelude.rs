//! Prelude module for common re-exports.
//!
//! ```rust
//! use xr_common::prelude::*;
//! ```

use std::time::Duration;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::control::config::{
    ChassisConfig, ControlConfig, GimbalConfig, LauncherConfig, MixerKind, PidParams,
    PositionActuatorParams, PowerModelConfig, RobotConfig, SpeedActuatorParams,
};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{CYCLE_TIME_US, MAX_FRIC_WHEELS, MAX_WHEELS, MOTOR_MAX_ROTATIONAL_SPEED};

// ─── Modes & Events ─────────────────────────────────────────────────
pub use crate::control::event::{ChassisEvent, EventId, GimbalEvent, LauncherEvent};
pub use crate::control::state::{ChassisMode, FireMode, GimbalMode, PowerMode, TrigMode};

// ─── Inputs ─────────────────────────────────────────────────────────
pub use crate::control::input::{
    CapInfo, ChassisCommand, Eulr, GimbalCommand, GimbalCommandKind, Gyro, Heading, RefereeData,
    RefereeStatus,
};

// ─── Status ─────────────────────────────────────────────────────────
pub use crate::control::status::{
    ChassisFlags, ChassisStatus, FeedAction, GimbalStatus, LauncherFlags, LauncherStatus,
    MoveVector,
};

/// Default control cycle as Duration.
pub const DEFAULT_CYCLE_TIME: Duration = Duration::from_micros(CYCLE_TIME_US as u64);

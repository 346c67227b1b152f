//! External input records consumed by the control core.
//!
//! Each record is published on a last-value topic by an upstream
//! collaborator (command arbitration, IMU driver, referee parser, energy
//! buffer). The core copies the latest value once per tick and treats it as
//! valid until a newer one arrives.

use serde::{Deserialize, Serialize};

// ─── Motion ─────────────────────────────────────────────────────────

/// Chassis motion intent. Translation `x`/`y` and rotation `z`, each nominally in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChassisCommand {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// How a gimbal command is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum GimbalCommandKind {
    /// Rate command in `[-1, 1]`, integrated over the cycle period.
    #[default]
    Relative = 0,
    /// Target attitude [rad].
    Absolute = 1,
}

/// Gimbal intent from the operator or the autonomy host.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GimbalCommand {
    pub yaw: f32,
    pub pit: f32,
    pub kind: GimbalCommandKind,
}

// ─── Attitude ───────────────────────────────────────────────────────

/// Euler attitude [rad].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Eulr {
    pub yaw: f32,
    pub pit: f32,
    pub rol: f32,
}

/// Angular rate [rad/s] in body axes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Gyro {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Heading of the chassis relative to the gimbal [rad], published by the gimbal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Heading {
    pub yaw: f32,
}

// ─── Referee / Energy buffer ────────────────────────────────────────

/// Referee link state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RefereeStatus {
    Offline = 0,
    Running = 1,
}

impl RefereeStatus {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Offline),
            1 => Some(Self::Running),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

impl Default for RefereeStatus {
    fn default() -> Self {
        Self::Offline
    }
}

/// Heat and power telemetry relayed from the referee system.
///
/// Limiting is only enforced while `status == Running`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RefereeData {
    pub status: RefereeStatus,
    /// Chassis power limit [W].
    pub chassis_power_limit: f32,
    /// Remaining chassis power buffer [J].
    pub chassis_power_buffer: f32,
    /// Current barrel heat.
    pub shooter_heat: f32,
    /// Barrel heat ceiling.
    pub shooter_heat_limit: f32,
    /// Heat dissipated per second.
    pub cooling_rate: f32,
}

/// Energy-buffer (super-capacitor) status.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CapInfo {
    pub online: bool,
    /// State of charge in `[0, 1]`.
    pub percentage: f32,
}

//! Mode enums for the actuated subsystems.
//!
//! All enums use `#[repr(u8)]` so they can travel as a single byte on the
//! event bus and in published status records. Exactly one value of each
//! enum is active per subsystem instance at any time.

use serde::{Deserialize, Serialize};

// ─── Chassis ────────────────────────────────────────────────────────

/// Chassis operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ChassisMode {
    /// Motors released, no holding torque.
    Relax = 0,
    /// Translation forced to zero, rotation still commanded.
    Break = 1,
    /// Translation in the gimbal frame, heading held on the gimbal.
    Follow = 2,
    /// Translation in the gimbal frame while spinning at a constant rate.
    Rotor = 3,
    /// Translation and rotation taken verbatim in the chassis frame.
    Independent = 4,
}

impl ChassisMode {
    /// Every mode, in discriminant order.
    pub const ALL: [Self; 5] = [
        Self::Relax,
        Self::Break,
        Self::Follow,
        Self::Rotor,
        Self::Independent,
    ];

    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Relax),
            1 => Some(Self::Break),
            2 => Some(Self::Follow),
            3 => Some(Self::Rotor),
            4 => Some(Self::Independent),
            _ => None,
        }
    }
}

impl Default for ChassisMode {
    fn default() -> Self {
        Self::Relax
    }
}

/// Which power budget the chassis may draw from when the energy buffer is online.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PowerMode {
    /// Stay within the referee budget even with the buffer online.
    Normal = 0,
    /// Draw on the energy buffer for a larger budget.
    Boost = 1,
}

impl PowerMode {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Normal),
            1 => Some(Self::Boost),
            _ => None,
        }
    }
}

impl Default for PowerMode {
    fn default() -> Self {
        Self::Boost
    }
}

// ─── Launcher ───────────────────────────────────────────────────────

/// Whether the friction wheels may spin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FireMode {
    /// Every launcher motor released.
    Relax = 0,
    /// Motors held, friction wheels commanded to zero.
    Safe = 1,
    /// Friction wheels at launch speed, feed may advance.
    Loaded = 2,
}

impl FireMode {
    pub const ALL: [Self; 3] = [Self::Relax, Self::Safe, Self::Loaded];

    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Relax),
            1 => Some(Self::Safe),
            2 => Some(Self::Loaded),
            _ => None,
        }
    }
}

impl Default for FireMode {
    fn default() -> Self {
        Self::Relax
    }
}

/// Feed cadence policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TrigMode {
    /// One projectile per rising fire edge.
    Single = 0,
    /// A fixed small burst per rising fire edge.
    Burst = 1,
    /// Feed at the minimum cadence while shots remain.
    Continued = 2,
    /// Never arm a burst.
    Stop = 3,
}

impl TrigMode {
    pub const ALL: [Self; 4] = [Self::Single, Self::Burst, Self::Continued, Self::Stop];

    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Single),
            1 => Some(Self::Burst),
            2 => Some(Self::Continued),
            3 => Some(Self::Stop),
            _ => None,
        }
    }

    /// Mode selected by the operator's "cycle trigger" button.
    ///
    /// SINGLE and BURST toggle; CONTINUED falls back to BURST and STOP to SINGLE.
    #[inline]
    pub const fn cycled(self) -> Self {
        match self {
            Self::Single => Self::Burst,
            Self::Burst => Self::Single,
            Self::Continued => Self::Burst,
            Self::Stop => Self::Single,
        }
    }
}

impl Default for TrigMode {
    fn default() -> Self {
        Self::Single
    }
}

// ─── Gimbal ─────────────────────────────────────────────────────────

/// Gimbal operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum GimbalMode {
    /// Motors released.
    Relax = 0,
    /// Attitude held in the world frame from operator commands.
    Absolute = 1,
    /// Attitude held from autonomy commands with the auto-aim gains.
    AutoAim = 2,
}

impl GimbalMode {
    pub const ALL: [Self; 3] = [Self::Relax, Self::Absolute, Self::AutoAim];

    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Relax),
            1 => Some(Self::Absolute),
            2 => Some(Self::AutoAim),
            _ => None,
        }
    }
}

impl Default for GimbalMode {
    fn default() -> Self {
        Self::Relax
    }
}

//! Mode-change events delivered on the event bus.
//!
//! Input sources (operator switches, button edges, autonomy directives)
//! publish raw `u32` ids. Each subsystem maps the ids it understands onto
//! its own event enum through a static table; unmapped ids are ignored so
//! unrelated sources can share one bus.

use serde::{Deserialize, Serialize};

/// Raw event-bus identifier.
pub type EventId = u32;

// ─── Chassis ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ChassisEvent {
    SetModeRelax = 0,
    SetModeBreak = 1,
    SetModeFollow = 2,
    SetModeRotor = 3,
    SetModeIndependent = 4,
    PowerNormal = 5,
    PowerBoost = 6,
}

impl ChassisEvent {
    pub const ALL: [Self; 7] = [
        Self::SetModeRelax,
        Self::SetModeBreak,
        Self::SetModeFollow,
        Self::SetModeRotor,
        Self::SetModeIndependent,
        Self::PowerNormal,
        Self::PowerBoost,
    ];
}

// ─── Launcher ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LauncherEvent {
    FireModeRelax = 0,
    FireModeSafe = 1,
    FireModeLoaded = 2,
    /// Fire request; only latched while the launcher is LOADED.
    StartFire = 3,
    TrigSingle = 4,
    TrigBurst = 5,
    TrigContinued = 6,
    TrigStop = 7,
    /// Operator "cycle trigger" button, see [`super::state::TrigMode::cycled`].
    TrigCycle = 8,
}

impl LauncherEvent {
    pub const ALL: [Self; 9] = [
        Self::FireModeRelax,
        Self::FireModeSafe,
        Self::FireModeLoaded,
        Self::StartFire,
        Self::TrigSingle,
        Self::TrigBurst,
        Self::TrigContinued,
        Self::TrigStop,
        Self::TrigCycle,
    ];
}

// ─── Gimbal ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum GimbalEvent {
    SetModeRelax = 0,
    SetModeAbsolute = 1,
    SetModeAutoAim = 2,
}

impl GimbalEvent {
    pub const ALL: [Self; 3] = [
        Self::SetModeRelax,
        Self::SetModeAbsolute,
        Self::SetModeAutoAim,
    ];
}

// ─── Default bus layout ─────────────────────────────────────────────
//
// Ids are grouped by input source: 0x01xx left switch, 0x02xx right
// switch, 0x03xx keyboard/mouse edges, 0x04xx autonomy host.

pub const EV_SW_L_UP: EventId = 0x0101;
pub const EV_SW_L_MID: EventId = 0x0102;
pub const EV_SW_L_DOWN: EventId = 0x0103;
pub const EV_SW_R_UP: EventId = 0x0201;
pub const EV_SW_R_MID: EventId = 0x0202;
pub const EV_SW_R_DOWN: EventId = 0x0203;
pub const EV_KEY_SHIFT: EventId = 0x0301;
pub const EV_KEY_CTRL: EventId = 0x0302;
pub const EV_KEY_G: EventId = 0x0303;
pub const EV_KEY_B: EventId = 0x0304;
pub const EV_MOUSE_LEFT: EventId = 0x0310;
pub const EV_HOST_AIM_ON: EventId = 0x0401;
pub const EV_HOST_AIM_OFF: EventId = 0x0402;

/// Default chassis bindings.
pub const CHASSIS_BINDINGS: &[(EventId, ChassisEvent)] = &[
    (EV_SW_L_UP, ChassisEvent::SetModeRotor),
    (EV_SW_L_MID, ChassisEvent::SetModeFollow),
    (EV_SW_L_DOWN, ChassisEvent::SetModeRelax),
    (EV_KEY_SHIFT, ChassisEvent::PowerBoost),
    (EV_KEY_CTRL, ChassisEvent::PowerNormal),
    (EV_KEY_B, ChassisEvent::SetModeIndependent),
];

/// Default launcher bindings.
pub const LAUNCHER_BINDINGS: &[(EventId, LauncherEvent)] = &[
    (EV_SW_R_UP, LauncherEvent::FireModeLoaded),
    (EV_SW_R_MID, LauncherEvent::FireModeSafe),
    (EV_SW_R_DOWN, LauncherEvent::FireModeRelax),
    (EV_MOUSE_LEFT, LauncherEvent::StartFire),
    (EV_KEY_G, LauncherEvent::TrigCycle),
];

/// Default gimbal bindings.
pub const GIMBAL_BINDINGS: &[(EventId, GimbalEvent)] = &[
    (EV_SW_L_UP, GimbalEvent::SetModeAbsolute),
    (EV_SW_L_MID, GimbalEvent::SetModeAbsolute),
    (EV_SW_L_DOWN, GimbalEvent::SetModeRelax),
    (EV_HOST_AIM_ON, GimbalEvent::SetModeAutoAim),
    (EV_HOST_AIM_OFF, GimbalEvent::SetModeAbsolute),
];

//! System-wide constants for the XR workspace.
//!
//! Single source of truth for numeric limits, cycle timing and physical
//! scaling factors shared by every subsystem.

use static_assertions::const_assert;

// ─── Cycle Timing ───────────────────────────────────────────────────

/// Default control cycle time in microseconds (500 Hz).
pub const CYCLE_TIME_US: u32 = 2000;

/// Lower bound for a configured cycle time [µs].
pub const CYCLE_TIME_US_MIN: u32 = 500;

/// Upper bound for a configured cycle time [µs].
pub const CYCLE_TIME_US_MAX: u32 = 20_000;

// ─── Event Bus ──────────────────────────────────────────────────────

/// Capacity of the per-subsystem mode-change event queue.
pub const EVENT_QUEUE_CAPACITY: usize = 16;

// ─── Motors ─────────────────────────────────────────────────────────

/// Full-scale wheel speed [rpm] corresponding to a mixer fraction of 1.0.
pub const MOTOR_MAX_ROTATIONAL_SPEED: f32 = 9600.0;

/// Number of wheels driven by the chassis mixers.
pub const MAX_WHEELS: usize = 4;

/// Maximum number of friction wheels on a launcher.
pub const MAX_FRIC_WHEELS: usize = 2;

// ─── Gimbal ─────────────────────────────────────────────────────────

/// Maximum gimbal slew rate for relative commands [rad/s] (1.5 turns/s).
pub const GIMBAL_MAX_SPEED: f32 = 2.0 * core::f32::consts::PI * 1.5;

// ─── Launcher ───────────────────────────────────────────────────────

/// Fraction of the expected feed travel below which a jam is declared.
pub const JAM_TRAVEL_RATIO: f32 = 0.8;

/// Shot allowance assumed while the referee link is not running.
pub const FALLBACK_SHOTS: u32 = 10;

const_assert!(CYCLE_TIME_US >= CYCLE_TIME_US_MIN && CYCLE_TIME_US <= CYCLE_TIME_US_MAX);
const_assert!(EVENT_QUEUE_CAPACITY > 0);
const_assert!(MAX_WHEELS == 4);
const_assert!(MAX_FRIC_WHEELS >= 1);

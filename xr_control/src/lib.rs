//! # XR Control
//!
//! Actuation-control core of the XR robot firmware: turns operator and host
//! intent into bounded, budget-respecting motor output on a fixed cycle.
//!
//! ## Layers
//!
//! 1. **Controller**: one exclusive lock per subsystem, event queue, event
//!    tables mapping bus ids to mode changes
//! 2. **Scheduler**: drift-corrected periodic loop: ingest → lock → drain
//!    events → feedback → control → publish
//! 3. **Subsystems**: chassis (mixing + power limiter), launcher (fire
//!    control + heat budget), gimbal
//! 4. **Actuators**: PID-based speed and cascade position loops
//!
//! Every abnormal runtime condition (jam, heat exhaustion, power cap, stale
//! telemetry) is state in the published status records, never an error
//! returned from the control cycle.

pub mod actuator;
pub mod chassis;
pub mod config;
pub mod controller;
pub mod cycle;
pub mod gimbal;
pub mod launcher;
pub mod motor;
pub mod sim;
pub mod topic;

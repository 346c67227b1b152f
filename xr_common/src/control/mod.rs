//! Shared types for the actuation-control core.
//!
//! Organized by domain: mode enums, bus events, external input records,
//! published status records with their condition flags, and configuration.

pub mod config;
pub mod event;
pub mod input;
pub mod state;
pub mod status;

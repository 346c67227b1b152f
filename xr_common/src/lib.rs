//! XR Common Library
//!
//! Shared constants, configuration loading and the data model of the
//! actuation-control core: modes, events, input records and status records.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Cycle timing, queue sizes and physical scaling constants
//! - [`control`] - Modes, events, inputs, status and subsystem configuration
//! - [`prelude`] - Common re-exports for convenience

pub mod config;
pub mod consts;
pub mod control;
pub mod prelude;

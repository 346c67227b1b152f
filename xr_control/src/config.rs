//! Robot configuration loading for the control binary.
//!
//! Wraps [`RobotConfig::load_validated`] with logging and the missing-file
//! fallback: a robot without a config file runs on the built-in defaults.

use std::path::Path;

use tracing::{info, warn};

use xr_common::config::ConfigError;
use xr_common::control::config::RobotConfig;

/// Load and validate `path`.
pub fn load_config(path: &Path) -> Result<RobotConfig, ConfigError> {
    let config = RobotConfig::load_validated(path)?;
    info!(
        path = %path.display(),
        service = %config.shared.service_name,
        cycle_time_us = config.control.cycle_time_us,
        mixer = ?config.chassis.mixer,
        "config loaded"
    );
    Ok(config)
}

/// Load `path`, falling back to defaults when the file does not exist.
///
/// Parse and validation errors are still returned.
pub fn load_or_default(path: &Path) -> Result<RobotConfig, ConfigError> {
    match load_config(path) {
        Err(ConfigError::FileNotFound(_)) => {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(RobotConfig::default())
        }
        other => other,
    }
}

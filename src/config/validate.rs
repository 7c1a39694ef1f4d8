// src/config/validate.rs

use crate::config::model::{RunnerConfiguration, SettingsFile};
use crate::errors::{DriverError, Result};

/// Run basic semantic validation against loaded settings.
///
/// This checks:
/// - the executable, if given, is not blank
/// - browser / reporter entries are non-empty and contain no commas
///   (they are comma-joined on the command line)
/// - the legacy failure marker, if given, is not empty
/// - the server process name is not empty
pub fn validate_settings(settings: &SettingsFile) -> Result<()> {
    validate_runner(&settings.runner.options)?;

    if let Some(marker) = &settings.policy.failure_marker {
        if marker.is_empty() {
            return Err(DriverError::ConfigError(
                "[policy].failure_marker must not be empty".to_string(),
            ));
        }
    }

    if settings.server.process_name.trim().is_empty() {
        return Err(DriverError::ConfigError(
            "[server].process_name must not be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validate a runner configuration, whichever layer it came from.
pub fn validate_runner(cfg: &RunnerConfiguration) -> Result<()> {
    if let Some(exe) = &cfg.executable {
        if exe.trim().is_empty() {
            return Err(DriverError::ConfigError(
                "runner executable must not be empty".to_string(),
            ));
        }
    }

    validate_list("browsers", cfg.browsers.as_deref())?;
    validate_list("reporters", cfg.reporters.as_deref())?;

    Ok(())
}

fn validate_list(field: &str, values: Option<&[String]>) -> Result<()> {
    for value in values.unwrap_or_default() {
        if value.trim().is_empty() {
            return Err(DriverError::ConfigError(format!(
                "{field} must not contain empty entries"
            )));
        }
        if value.contains(',') {
            return Err(DriverError::ConfigError(format!(
                "{field} entry '{value}' must not contain ','"
            )));
        }
    }
    Ok(())
}

// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::SettingsFile;
use crate::config::validate::validate_settings;
use crate::errors::{DriverError, Result};

/// Load a settings file from a given path without validating it.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<SettingsFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        DriverError::ConfigError(format!("reading settings file {:?}: {e}", path))
    })?;

    let settings: SettingsFile = toml::from_str(&contents)?;

    Ok(settings)
}

/// Load a settings file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<SettingsFile> {
    let settings = load_from_path(&path)?;
    validate_settings(&settings)?;
    Ok(settings)
}

/// Resolve the settings for this invocation.
///
/// - An explicit path must exist.
/// - Otherwise [`default_settings_path`] is used when present.
/// - With neither, every section takes its defaults.
pub fn load_settings(explicit: Option<&Path>) -> Result<SettingsFile> {
    if let Some(path) = explicit {
        debug!(path = ?path, "loading explicit settings file");
        return load_and_validate(path);
    }

    let default_path = default_settings_path();
    if default_path.is_file() {
        debug!(path = ?default_path, "loading default settings file");
        return load_and_validate(default_path);
    }

    debug!("no settings file found; using defaults");
    Ok(SettingsFile::default())
}

/// Settings file looked up in the current working directory.
pub fn default_settings_path() -> PathBuf {
    PathBuf::from("KarmaDriver.toml")
}

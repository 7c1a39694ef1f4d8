// src/config/mod.rs

//! Driver settings and the runner configuration model.
//!
//! Responsibilities:
//! - Define the TOML-backed settings model and `RunnerConfiguration`
//!   (`model.rs`).
//! - Load the optional settings file from disk (`loader.rs`).
//! - Validate values before anything is launched (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_settings};
pub use model::{
    DEFAULT_CONFIG_FILE, DEFAULT_EXECUTABLE, DEFAULT_FAILURE_MARKER, DEFAULT_REPORTS_DIRECTORY,
    PolicySection, ReportsSection, RunnerConfiguration, RunnerSection, ServerSection, SettingsFile,
};
pub use validate::{validate_runner, validate_settings};

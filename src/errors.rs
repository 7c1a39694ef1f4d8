// src/errors.rs

//! Crate-wide error type.
//!
//! Errors fall into two families that must never be collapsed into one
//! signal at the build boundary:
//!
//! - [`ErrorKind::TestFailure`]: the runner ran and reported failing tests.
//!   This is the only family that `failure_ignore` may downgrade.
//! - [`ErrorKind::Environment`]: anything that stopped the runner from
//!   producing a verdict (missing config file, spawn failure, broken output
//!   pipe, interruption, unwritable reports directory, ...).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("There were test failures (exit code {})", display_code(*.exit_code))]
    TestFailure { exit_code: Option<i32> },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cannot read the runner configuration file {path:?}: {source}")]
    RunnerConfigUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Reports directory error: {0}")]
    ReportsDirectory(String),

    #[error("There was an error executing `{command}`: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("There was an error reading the output from the runner: {0}")]
    OutputStream(#[source] io::Error),

    #[error("The runner process was interrupted")]
    Interrupted,

    #[error("There was an error killing stale `{process}` processes: {source}")]
    StaleProcessKill {
        process: String,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Which side of the build boundary an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    TestFailure,
    Environment,
}

impl DriverError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DriverError::TestFailure { .. } => ErrorKind::TestFailure,
            _ => ErrorKind::Environment,
        }
    }

    pub fn is_test_failure(&self) -> bool {
        self.kind() == ErrorKind::TestFailure
    }
}

fn display_code(code: Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub type Result<T> = std::result::Result<T, DriverError>;

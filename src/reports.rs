// src/reports.rs

//! Junit report handling around a completed run.
//!
//! Before the run, the reports directory is created and the runner's junit
//! reporter is switched on. After the run, the report the runner wrote is
//! copied into the reports directory. Only the directory step can fail the
//! goal; a missing or uncopyable report is a warning.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::errors::{DriverError, Result};
use crate::fs::FileSystem;

/// Reporter name listed in the runner's `reporters`.
pub const JUNIT_REPORTER: &str = "junit";

/// Plugin that provides the junit reporter.
pub const JUNIT_REPORTER_PLUGIN: &str = "karma-junit-reporter";

/// Where a run's report is expected and where it should end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    pub directory: PathBuf,
    pub artifact: PathBuf,
}

/// Create the reports directory if needed and check it can be written to.
pub fn prepare_reports_dir(fs: &dyn FileSystem, dir: &Path) -> Result<()> {
    if !fs.exists(dir) {
        fs.create_dir_all(dir).map_err(|e| {
            DriverError::ReportsDirectory(format!("cannot create reporting directory {:?}: {e}", dir))
        })?;
    }

    if !fs.is_dir(dir) || !fs.is_writable_dir(dir) {
        return Err(DriverError::ReportsDirectory(format!(
            "cannot write to the reporting directory {:?}",
            dir
        )));
    }

    Ok(())
}

/// Make sure the junit reporter runs.
///
/// - `reporters` unset: only set it to `junit` when the runner config does
///   not already list the reporter (so the config's own list is kept).
/// - `reporters` set: append `junit` if missing.
///
/// Warns when the config text does not mention the reporter plugin.
pub fn enable_junit_reporter(config_text: &str, reporters: Option<Vec<String>>) -> Option<Vec<String>> {
    info!("enabling the runner's junit reporter ({JUNIT_REPORTER_PLUGIN})");

    let reporters = match reporters {
        None if config_text.contains(&quoted(JUNIT_REPORTER)) => None,
        None => Some(vec![JUNIT_REPORTER.to_string()]),
        Some(mut list) => {
            if !list.iter().any(|r| r == JUNIT_REPORTER) {
                list.push(JUNIT_REPORTER.to_string());
            }
            Some(list)
        }
    };

    if !config_text.contains(&quoted(JUNIT_REPORTER_PLUGIN)) {
        warn!(
            "could not find the {JUNIT_REPORTER_PLUGIN} plugin in the runner configuration file; \
             test results may be unavailable or incorrect"
        );
    }

    reporters
}

fn quoted(name: &str) -> String {
    format!("'{name}'")
}

/// What happened to the report after a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportCollection {
    Copied(PathBuf),
    Missing,
    CopyFailed,
}

/// Copy `settings.artifact` into `settings.directory`, keeping its file name.
pub fn collect_report(fs: &dyn FileSystem, settings: &ReportSettings) -> ReportCollection {
    let artifact = &settings.artifact;

    if !fs.is_file(artifact) {
        warn!(
            artifact = ?artifact,
            "the junit reporter was enabled but no results were found; is the reporter plugin \
             ({JUNIT_REPORTER_PLUGIN}) installed and enabled in the runner configuration file?"
        );
        return ReportCollection::Missing;
    }

    let Some(file_name) = artifact.file_name() else {
        warn!(artifact = ?artifact, "report path has no file name; not copying");
        return ReportCollection::CopyFailed;
    };
    let target = settings.directory.join(file_name);

    match fs.copy(artifact, &target) {
        Ok(bytes) => {
            info!(target = ?target, bytes, "copied junit report");
            ReportCollection::Copied(target)
        }
        Err(e) => {
            warn!(
                directory = ?settings.directory,
                error = %e,
                "could not copy the junit report"
            );
            ReportCollection::CopyFailed
        }
    }
}

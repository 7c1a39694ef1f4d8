// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

/// Executable used when neither the CLI nor the settings file name one.
///
/// Resolved through the invoking shell's search path.
pub const DEFAULT_EXECUTABLE: &str = "karma";

/// Runner configuration file used when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "karma.conf.js";

pub const DEFAULT_REPORTS_DIRECTORY: &str = "target/karma-reports";

pub const DEFAULT_FAILURE_MARKER: &str = "FAILED";

/// The optional knobs passed through to the runner.
///
/// Every field is independently optional. `None` means "pass no flag and let
/// the runner use its own default"; it is never the same as `Some(false)` or
/// `Some(0)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RunnerConfiguration {
    pub browsers: Option<Vec<String>>,
    pub auto_watch: Option<bool>,
    pub reporters: Option<Vec<String>>,
    /// Browser capture timeout in milliseconds.
    pub capture_timeout: Option<u64>,
    /// Threshold in milliseconds beyond which slow tests are reported.
    pub report_slower_than: Option<u64>,
    pub single_run: Option<bool>,
    pub colors: Option<bool>,
    pub working_directory: Option<PathBuf>,
    pub executable: Option<String>,
}

impl RunnerConfiguration {
    /// Field-wise overlay: values set in `top` win, unset ones fall back to
    /// `self`.
    pub fn overlay(self, top: RunnerConfiguration) -> RunnerConfiguration {
        RunnerConfiguration {
            browsers: top.browsers.or(self.browsers),
            auto_watch: top.auto_watch.or(self.auto_watch),
            reporters: top.reporters.or(self.reporters),
            capture_timeout: top.capture_timeout.or(self.capture_timeout),
            report_slower_than: top.report_slower_than.or(self.report_slower_than),
            single_run: top.single_run.or(self.single_run),
            colors: top.colors.or(self.colors),
            working_directory: top.working_directory.or(self.working_directory),
            executable: top.executable.or(self.executable),
        }
    }

    /// The executable to launch, falling back to [`DEFAULT_EXECUTABLE`].
    pub fn executable(&self) -> &str {
        self.executable.as_deref().unwrap_or(DEFAULT_EXECUTABLE)
    }
}

/// Top-level settings file (`KarmaDriver.toml`).
///
/// ```toml
/// [runner]
/// config_file = "karma.conf.js"
/// browsers = ["ChromeHeadless"]
/// single_run = true
///
/// [policy]
/// failure_ignore = false
///
/// [reports]
/// junit_report_file = "target/karma/junit.xml"
///
/// [server]
/// process_name = "node"
/// ```
///
/// All sections are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub runner: RunnerSection,

    #[serde(default)]
    pub policy: PolicySection,

    #[serde(default)]
    pub reports: ReportsSection,

    #[serde(default)]
    pub server: ServerSection,
}

/// `[runner]` section: the runner config file plus every runner knob.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunnerSection {
    #[serde(default)]
    pub config_file: Option<PathBuf>,

    #[serde(flatten)]
    pub options: RunnerConfiguration,
}

/// `[policy]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicySection {
    /// Skip the runner entirely (same as `--skip-karma`).
    #[serde(default)]
    pub skip: bool,

    /// Downgrade test failures to a warning.
    #[serde(default)]
    pub failure_ignore: bool,

    /// Legacy: also treat a last output line containing this text as a
    /// failure.
    #[serde(default)]
    pub failure_marker: Option<String>,
}

/// `[reports]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportsSection {
    /// Directory the report artifact is copied into.
    ///
    /// Defaults to [`DEFAULT_REPORTS_DIRECTORY`] when a report file is set.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Report file written by the runner's junit reporter.
    #[serde(default)]
    pub junit_report_file: Option<PathBuf>,
}

/// `[server]` section, used by `start-server` only.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    /// Name of the runner's host process killed before a new server starts.
    #[serde(default = "default_process_name")]
    pub process_name: String,

    /// Where the generated POSIX launch script is written.
    #[serde(default = "default_script_path")]
    pub script_path: PathBuf,

    /// Log file receiving the detached server's output on POSIX.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

fn default_process_name() -> String {
    "node".to_string()
}

fn default_script_path() -> PathBuf {
    PathBuf::from("start_karma.sh")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("karma-server.log")
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            process_name: default_process_name(),
            script_path: default_script_path(),
            log_file: default_log_file(),
        }
    }
}

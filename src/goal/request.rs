// src/goal/request.rs

//! Resolution of CLI arguments and settings into one [`GoalRequest`].
//!
//! Precedence for every value: command line, then settings file, then the
//! built-in default (which for runner knobs means "not passed at all").

use std::path::{Path, PathBuf};

use crate::cli::GoalCommand;
use crate::config::{
    DEFAULT_CONFIG_FILE, DEFAULT_REPORTS_DIRECTORY, RunnerConfiguration, ServerSection,
    SettingsFile, validate_runner,
};
use crate::errors::{DriverError, Result};
use crate::exec::OutcomePolicy;
use crate::reports::ReportSettings;
use crate::types::Goal;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipFlags {
    /// Skip this runner only.
    pub skip_karma: bool,
    /// Skip every kind of test.
    pub skip_tests: bool,
}

impl SkipFlags {
    pub fn any(&self) -> bool {
        self.skip_karma || self.skip_tests
    }
}

/// Everything one goal invocation needs, read-only once resolved.
#[derive(Debug, Clone)]
pub struct GoalRequest {
    pub goal: Goal,
    /// The runner's own configuration file (absolute).
    pub config_file: PathBuf,
    pub runner: RunnerConfiguration,
    pub skip: SkipFlags,
    pub failure_ignore: bool,
    pub outcome_policy: OutcomePolicy,
    /// Set when a junit report should be collected (`start` only).
    pub reports: Option<ReportSettings>,
    pub server: ServerSection,
}

impl GoalRequest {
    /// A request with defaults everywhere except the goal and config file.
    pub fn new(goal: Goal, config_file: impl Into<PathBuf>) -> Self {
        let runner = RunnerConfiguration {
            single_run: (goal == Goal::Start).then_some(true),
            ..RunnerConfiguration::default()
        };

        Self {
            goal,
            config_file: config_file.into(),
            runner,
            skip: SkipFlags::default(),
            failure_ignore: false,
            outcome_policy: OutcomePolicy::ExitStatus,
            reports: None,
            server: ServerSection::default(),
        }
    }

    pub fn resolve(command: &GoalCommand, settings: SettingsFile) -> Result<Self> {
        let goal = command.goal();
        let common = command.common();

        let overrides = command.runner_overrides();
        validate_runner(&overrides)?;

        let mut runner = settings.runner.options.overlay(overrides);
        if goal == Goal::Start {
            runner.single_run = Some(runner.single_run.unwrap_or(true));
        }

        let config_file = common
            .config_file
            .clone()
            .or(settings.runner.config_file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let config_file = std::path::absolute(&config_file)?;

        let marker = common
            .failure_marker
            .clone()
            .or(settings.policy.failure_marker);
        let outcome_policy = match marker {
            Some(m) if m.is_empty() => {
                return Err(DriverError::ConfigError(
                    "failure marker must not be empty".to_string(),
                ));
            }
            Some(m) => OutcomePolicy::FailureMarker(m),
            None => OutcomePolicy::ExitStatus,
        };

        // The runner writes its report relative to its own working directory;
        // the reports directory belongs to the build.
        let reports = match command {
            GoalCommand::Start(args) => {
                match args
                    .junit_report_file
                    .clone()
                    .or(settings.reports.junit_report_file)
                {
                    Some(artifact) => {
                        let directory = args
                            .reports_directory
                            .clone()
                            .or(settings.reports.directory.clone())
                            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORTS_DIRECTORY));
                        Some(ReportSettings {
                            directory: std::path::absolute(directory)?,
                            artifact: resolve_in(runner.working_directory.as_deref(), &artifact)?,
                        })
                    }
                    None => None,
                }
            }
            _ => None,
        };

        let mut server = settings.server;
        if let GoalCommand::StartServer(args) = command {
            if let Some(name) = &args.process_name {
                server.process_name = name.clone();
            }
            if let Some(path) = &args.script_path {
                server.script_path = path.clone();
            }
            if let Some(path) = &args.log_file {
                server.log_file = path.clone();
            }
        }
        if server.process_name.trim().is_empty() {
            return Err(DriverError::ConfigError(
                "server process name must not be empty".to_string(),
            ));
        }

        Ok(Self {
            goal,
            config_file,
            runner,
            skip: SkipFlags {
                skip_karma: common.skip_karma || settings.policy.skip,
                skip_tests: common.skip_tests,
            },
            failure_ignore: common.failure_ignore || settings.policy.failure_ignore,
            outcome_policy,
            reports,
            server,
        })
    }

    /// Whether a failed run fails the goal. `run` always triggers exactly
    /// one run; `start` follows its single-run setting.
    pub fn single_run(&self) -> bool {
        match self.goal {
            Goal::Start => self.runner.single_run.unwrap_or(true),
            Goal::Run => true,
            Goal::StartServer => false,
        }
    }
}

/// Absolute form of `path`, taking a relative one as relative to `base`.
fn resolve_in(base: Option<&Path>, path: &Path) -> Result<PathBuf> {
    let joined = match base {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    };
    Ok(std::path::absolute(joined)?)
}

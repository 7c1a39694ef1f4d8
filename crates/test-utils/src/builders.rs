#![allow(dead_code)]

use std::path::{Path, PathBuf};

use karma_driver::config::{RunnerConfiguration, ServerSection};
use karma_driver::exec::OutcomePolicy;
use karma_driver::goal::{GoalRequest, SkipFlags};
use karma_driver::reports::ReportSettings;
use karma_driver::types::Goal;

/// Builder for `RunnerConfiguration`.
#[derive(Default)]
pub struct RunnerConfigBuilder {
    cfg: RunnerConfiguration,
}

impl RunnerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn browsers(mut self, list: &[&str]) -> Self {
        self.cfg.browsers = Some(list.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn reporters(mut self, list: &[&str]) -> Self {
        self.cfg.reporters = Some(list.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn single_run(mut self, val: bool) -> Self {
        self.cfg.single_run = Some(val);
        self
    }

    pub fn auto_watch(mut self, val: bool) -> Self {
        self.cfg.auto_watch = Some(val);
        self
    }

    pub fn capture_timeout(mut self, ms: u64) -> Self {
        self.cfg.capture_timeout = Some(ms);
        self
    }

    pub fn report_slower_than(mut self, ms: u64) -> Self {
        self.cfg.report_slower_than = Some(ms);
        self
    }

    pub fn colors(mut self, val: bool) -> Self {
        self.cfg.colors = Some(val);
        self
    }

    pub fn executable(mut self, exe: impl AsRef<Path>) -> Self {
        self.cfg.executable = Some(exe.as_ref().display().to_string());
        self
    }

    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cfg.working_directory = Some(dir.into());
        self
    }

    pub fn build(self) -> RunnerConfiguration {
        self.cfg
    }
}

/// Builder for `GoalRequest`.
pub struct GoalRequestBuilder {
    request: GoalRequest,
}

impl GoalRequestBuilder {
    pub fn new(goal: Goal, config_file: impl Into<PathBuf>) -> Self {
        Self {
            request: GoalRequest::new(goal, config_file),
        }
    }

    /// Replaces the runner knobs, keeping `start`'s single-run default.
    pub fn runner(mut self, cfg: RunnerConfiguration) -> Self {
        let single_run = cfg.single_run.or(self.request.runner.single_run);
        self.request.runner = RunnerConfiguration { single_run, ..cfg };
        self
    }

    pub fn executable(mut self, exe: impl AsRef<Path>) -> Self {
        self.request.runner.executable = Some(exe.as_ref().display().to_string());
        self
    }

    pub fn skip_karma(mut self) -> Self {
        self.request.skip = SkipFlags {
            skip_karma: true,
            ..self.request.skip
        };
        self
    }

    pub fn skip_tests(mut self) -> Self {
        self.request.skip = SkipFlags {
            skip_tests: true,
            ..self.request.skip
        };
        self
    }

    pub fn failure_ignore(mut self, val: bool) -> Self {
        self.request.failure_ignore = val;
        self
    }

    pub fn failure_marker(mut self, marker: &str) -> Self {
        self.request.outcome_policy = OutcomePolicy::FailureMarker(marker.to_string());
        self
    }

    pub fn reports(mut self, directory: impl Into<PathBuf>, artifact: impl Into<PathBuf>) -> Self {
        self.request.reports = Some(ReportSettings {
            directory: directory.into(),
            artifact: artifact.into(),
        });
        self
    }

    pub fn server(mut self, server: ServerSection) -> Self {
        self.request.server = server;
        self
    }

    pub fn build(self) -> GoalRequest {
        self.request
    }
}

// src/goal/orchestrator.rs

//! Run-phase state machine for a single goal invocation.
//!
//! ```text
//! Idle -> (skip-check) -> Skipped
//!                      -> Launching -> Running -> Completed
//! ```
//!
//! - Skipped performs no process work and succeeds.
//! - Launching checks the runner config file and the reports directory
//!   before anything is spawned.
//! - Running drains the runner (blocking goals) or hands it to the server
//!   manager (background goal, which does not block).
//! - Completed applies the failure policy and collects the report.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use tokio::io::AsyncWrite;
use tracing::{debug, info, warn};

use crate::errors::{DriverError, Result};
use crate::exec::{
    ColorMode, CommandInvocation, OutputPump, ProcessLauncher, RunOutcome, ServerManager,
    StaleProcessKiller, SystemKiller,
};
use crate::fs::{FileSystem, RealFileSystem};
use crate::goal::request::GoalRequest;
use crate::platform::SharedPlatform;
use crate::reports::{ReportCollection, collect_report, enable_junit_reporter, prepare_reports_dir};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Skipped,
    Launching,
    Running,
    Completed,
}

/// How a goal that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalVerdict {
    Skipped,
    Passed,
    /// Tests failed but `failure_ignore` downgraded it to a warning.
    FailureIgnored,
    /// Watch mode: the runner produced no pass/fail verdict.
    NoVerdict,
    ServerStarted,
}

/// Turn a decided outcome into the goal's verdict.
///
/// Only a failed single run can fail the goal, and only when failures are
/// not ignored.
pub fn apply_failure_policy(outcome: &RunOutcome, single_run: bool, failure_ignore: bool) -> Result<GoalVerdict> {
    if !single_run {
        debug!(success = outcome.success, "watch mode; no verdict");
        return Ok(GoalVerdict::NoVerdict);
    }

    if outcome.success {
        return Ok(GoalVerdict::Passed);
    }

    if failure_ignore {
        warn!(exit_code = ?outcome.exit_code, "There were test failures.");
        return Ok(GoalVerdict::FailureIgnored);
    }

    Err(DriverError::TestFailure {
        exit_code: outcome.exit_code,
    })
}

/// Executes goal requests against real processes.
///
/// The console writer receives the runner's output; production passes
/// `tokio::io::stdout()`.
pub struct GoalRunner<W> {
    launcher: ProcessLauncher,
    killer: Arc<dyn StaleProcessKiller>,
    fs: Arc<dyn FileSystem>,
    console: W,
    phase: RunPhase,
    report: Option<ReportCollection>,
}

impl<W> GoalRunner<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(platform: SharedPlatform, console: W) -> Self {
        Self {
            launcher: ProcessLauncher::new(platform.clone()),
            killer: Arc::new(SystemKiller::new(platform)),
            fs: Arc::new(RealFileSystem),
            console,
            phase: RunPhase::Idle,
            report: None,
        }
    }

    pub fn with_killer(mut self, killer: Arc<dyn StaleProcessKiller>) -> Self {
        self.killer = killer;
        self
    }

    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// The phase the last [`GoalRunner::execute`] call reached.
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// What happened to the junit report in the last run, if one was
    /// requested.
    pub fn report(&self) -> Option<&ReportCollection> {
        self.report.as_ref()
    }

    pub fn console(&self) -> &W {
        &self.console
    }

    pub async fn execute<F>(&mut self, request: &GoalRequest, interrupt: F) -> Result<GoalVerdict>
    where
        F: Future<Output = ()>,
    {
        self.phase = RunPhase::Idle;
        self.report = None;

        if request.skip.any() {
            info!(goal = %request.goal, "Skipping test runner execution.");
            self.enter(RunPhase::Skipped);
            return Ok(GoalVerdict::Skipped);
        }

        let config_text = read_runner_config(self.fs.as_ref(), &request.config_file)?;

        let mut runner = request.runner.clone();
        if let Some(reports) = &request.reports {
            prepare_reports_dir(self.fs.as_ref(), &reports.directory)?;
            runner.reporters = enable_junit_reporter(&config_text, runner.reporters);
        }

        self.enter(RunPhase::Launching);

        if request.goal.is_background() {
            let manager = ServerManager::new(self.launcher.clone(), self.killer.clone());
            manager
                .start(&request.config_file, &runner, &request.server)
                .await?;
            self.enter(RunPhase::Completed);
            return Ok(GoalVerdict::ServerStarted);
        }

        info!(goal = %request.goal, "executing test suite");
        let invocation = CommandInvocation::for_goal(request.goal, &request.config_file, &runner);
        let process = self.launcher.launch(&invocation)?;

        self.enter(RunPhase::Running);
        let mut pump = OutputPump::new(
            &mut self.console,
            ColorMode::for_colors(runner.colors),
            request.outcome_policy.clone(),
        );
        let outcome = pump.drain(process, interrupt).await?;

        self.enter(RunPhase::Completed);

        self.report = request
            .reports
            .as_ref()
            .map(|reports| collect_report(self.fs.as_ref(), reports));

        apply_failure_policy(&outcome, request.single_run(), request.failure_ignore)
    }

    fn enter(&mut self, phase: RunPhase) {
        debug!(from = ?self.phase, to = ?phase, "run phase transition");
        self.phase = phase;
    }
}

/// The runner config file must exist and be readable before launch.
fn read_runner_config(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    if !fs.exists(path) {
        return Err(DriverError::ConfigError(format!(
            "cannot read the runner configuration file because it does not exist: {:?}",
            path
        )));
    }

    fs.read_to_string(path)
        .map_err(|source| DriverError::RunnerConfigUnreadable {
            path: path.to_path_buf(),
            source,
        })
}

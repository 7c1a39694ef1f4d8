// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every runner option is optional on the command line; an option that is
//! not given falls back to the settings file and then to "not passed to the
//! runner at all".

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{DEFAULT_FAILURE_MARKER, RunnerConfiguration};
use crate::types::Goal;

/// Command-line arguments for `karma-driver`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "karma-driver",
    version,
    about = "Drive a browser test runner as part of a build.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the driver settings file (TOML).
    ///
    /// Default: `KarmaDriver.toml` in the current directory, if present.
    #[arg(long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `KARMA_DRIVER_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: GoalCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum GoalCommand {
    /// Run the test suite and block until the runner reports a result.
    Start(StartArgs),

    /// Start the runner as a detached background server in watch mode.
    #[command(alias = "startServer")]
    StartServer(ServerArgs),

    /// Trigger a run against an already running server.
    Run(RunArgs),
}

impl GoalCommand {
    pub fn goal(&self) -> Goal {
        match self {
            GoalCommand::Start(_) => Goal::Start,
            GoalCommand::StartServer(_) => Goal::StartServer,
            GoalCommand::Run(_) => Goal::Run,
        }
    }

    pub fn common(&self) -> &CommonArgs {
        match self {
            GoalCommand::Start(a) => &a.common,
            GoalCommand::StartServer(a) => &a.common,
            GoalCommand::Run(a) => &a.common,
        }
    }
}

/// Options shared by every goal.
#[derive(Debug, Clone, Default, Args)]
pub struct CommonArgs {
    /// Path to the runner's own configuration file.
    #[arg(long, value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Runner executable (default: `karma` from the search path).
    #[arg(long, value_name = "PATH")]
    pub executable: Option<String>,

    /// Directory the runner is started in (where node_modules lives).
    #[arg(long, value_name = "DIR")]
    pub working_directory: Option<PathBuf>,

    /// Skip this runner only.
    #[arg(long)]
    pub skip_karma: bool,

    /// Skip all tests, this runner included.
    #[arg(long)]
    pub skip_tests: bool,

    /// Do not fail the build when tests fail; log a warning instead.
    #[arg(long)]
    pub failure_ignore: bool,

    /// Legacy: also fail when the last output line contains this text
    /// (`FAILED` when given without a value).
    #[arg(
        long,
        value_name = "TEXT",
        num_args = 0..=1,
        default_missing_value = DEFAULT_FAILURE_MARKER
    )]
    pub failure_marker: Option<String>,
}

/// Runner knobs accepted by the goals that launch `start`.
#[derive(Debug, Clone, Default, Args)]
pub struct RunnerArgs {
    /// Comma-separated list of browsers.
    #[arg(long, value_delimiter = ',', value_name = "LIST")]
    pub browsers: Option<Vec<String>>,

    /// Comma-separated list of reporters.
    #[arg(long, value_delimiter = ',', value_name = "LIST")]
    pub reporters: Option<Vec<String>>,

    /// Re-run automatically when watched files change.
    #[arg(long, value_name = "BOOL")]
    pub auto_watch: Option<bool>,

    /// Browser capture timeout in milliseconds.
    #[arg(long, value_name = "MS")]
    pub capture_timeout: Option<u64>,

    /// Report tests slower than this many milliseconds.
    #[arg(long, value_name = "MS")]
    pub report_slower_than: Option<u64>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct StartArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub runner: RunnerArgs,

    /// Exit after a single run (default: true).
    #[arg(long, value_name = "BOOL")]
    pub single_run: Option<bool>,

    /// Force the runner's coloured output on or off.
    #[arg(long, value_name = "BOOL")]
    pub colors: Option<bool>,

    /// Directory the junit report is copied into.
    #[arg(long, value_name = "DIR")]
    pub reports_directory: Option<PathBuf>,

    /// Report file written by the runner's junit reporter.
    #[arg(long, value_name = "PATH")]
    pub junit_report_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ServerArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub runner: RunnerArgs,

    /// Host process name killed before the new server starts.
    #[arg(long, value_name = "NAME")]
    pub process_name: Option<String>,

    /// Where the generated POSIX launch script is written.
    #[arg(long, value_name = "PATH")]
    pub script_path: Option<PathBuf>,

    /// Log file for the detached server's output (POSIX).
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

impl GoalCommand {
    /// The runner configuration layer given on the command line.
    pub fn runner_overrides(&self) -> RunnerConfiguration {
        let common = self.common();
        let mut cfg = RunnerConfiguration {
            executable: common.executable.clone(),
            working_directory: common.working_directory.clone(),
            ..RunnerConfiguration::default()
        };

        let runner = match self {
            GoalCommand::Start(a) => {
                cfg.single_run = a.single_run;
                cfg.colors = a.colors;
                Some(&a.runner)
            }
            GoalCommand::StartServer(a) => Some(&a.runner),
            GoalCommand::Run(_) => None,
        };

        if let Some(r) = runner {
            cfg.browsers = r.browsers.clone();
            cfg.reporters = r.reporters.clone();
            cfg.auto_watch = r.auto_watch;
            cfg.capture_timeout = r.capture_timeout;
            cfg.report_slower_than = r.report_slower_than;
        }

        cfg
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

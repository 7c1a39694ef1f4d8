// src/lib.rs

pub mod args;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod exit_codes;
pub mod fs;
pub mod goal;
pub mod logging;
pub mod platform;
pub mod reports;
pub mod types;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::load_settings;
use crate::errors::Result;
use crate::exec::ctrl_c_interrupt;
use crate::goal::{GoalRequest, GoalRunner, GoalVerdict};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings loading and goal request resolution
/// - the host platform capability
/// - the goal runner writing runner output to stdout
/// - Ctrl-C handling while the runner is supervised
pub async fn run(args: CliArgs) -> Result<GoalVerdict> {
    let settings = load_settings(args.settings.as_deref())?;
    let request = GoalRequest::resolve(&args.command, settings)?;
    debug!(?request, "resolved goal request");

    let mut runner = GoalRunner::new(platform::host(), tokio::io::stdout());
    let verdict = runner.execute(&request, ctrl_c_interrupt()).await?;

    info!(goal = %request.goal, ?verdict, "goal finished");
    Ok(verdict)
}

// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the test runner, using
//! `tokio::process::Command`.
//!
//! - [`invocation`] holds the immutable command line for one goal.
//! - [`launcher`] wraps it for the host platform and spawns it.
//! - [`pump`] streams the merged output and decides the run outcome.
//! - [`server`] kills stale servers and launches detached ones.

pub mod invocation;
pub mod launcher;
pub mod pump;
pub mod server;

pub use invocation::CommandInvocation;
pub use launcher::{DetachedProcess, ProcessLauncher, RunnerProcess};
pub use pump::{ColorMode, OutcomePolicy, OutputPump, RunOutcome, ctrl_c_interrupt};
pub use server::{DetachStrategy, ServerManager, StaleProcessKiller, SystemKiller};

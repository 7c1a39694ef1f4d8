// src/types.rs

use std::fmt;

/// The build-time operations exposed by the driver.
///
/// - `Start`: run the suite and block for its verdict.
/// - `StartServer`: launch a detached watch-mode server and return.
/// - `Run`: trigger a run against an already running server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    Start,
    StartServer,
    Run,
}

impl Goal {
    /// Subcommand passed to the runner for this goal.
    pub fn runner_subcommand(self) -> &'static str {
        match self {
            Goal::Start | Goal::StartServer => "start",
            Goal::Run => "run",
        }
    }

    /// Whether the runner is launched detached instead of supervised.
    pub fn is_background(self) -> bool {
        matches!(self, Goal::StartServer)
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Goal::Start => "start",
            Goal::StartServer => "startServer",
            Goal::Run => "run",
        };
        f.write_str(name)
    }
}

// src/exec/launcher.rs

//! Platform-aware process start.
//!
//! - Windows family: the invocation is routed through `cmd /C` so `.cmd` /
//!   `.bat` shims (which is how npm installs the runner) resolve.
//! - POSIX: the executable is started directly, no shell wrapper.
//!
//! The final command line is printed before spawning. A spawn failure is an
//! environment error and is never retried.
//!
//! A supervised runner writes stdout and stderr into one pipe, so the reader
//! sees the lines in the order they were written. On POSIX it also leads its
//! own process group, which [`terminate_tree`] kills as a whole.

use std::io::PipeReader;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::errors::{DriverError, Result};
use crate::exec::invocation::CommandInvocation;
use crate::platform::SharedPlatform;

/// A started, supervised runner process.
///
/// Owned by whoever started it; the output pump takes it over for draining.
#[derive(Debug)]
pub struct RunnerProcess {
    pub child: Child,
    pub command: String,
    /// Read end of the pipe shared by stdout and stderr, when merged.
    pub merged_output: Option<PipeReader>,
    /// Whether the process tree is torn down with `taskkill /T`.
    pub windows_family: bool,
}

/// A process deliberately left running on its own.
#[derive(Debug, Clone)]
pub struct DetachedProcess {
    pub pid: Option<u32>,
    pub command: String,
}

#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    platform: SharedPlatform,
}

impl ProcessLauncher {
    pub fn new(platform: SharedPlatform) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> &SharedPlatform {
        &self.platform
    }

    /// The exact argv that will be executed for `inv` on this platform.
    pub fn platform_tokens(&self, inv: &CommandInvocation) -> Vec<String> {
        let mut tokens = Vec::with_capacity(inv.tokens().len() + 2);
        if self.platform.is_windows_family() {
            tokens.push("cmd".to_string());
            tokens.push("/C".to_string());
        }
        tokens.extend(inv.tokens().iter().cloned());
        tokens
    }

    /// Start `inv` with its output captured.
    ///
    /// With `merge_stderr` both streams share one pipe; otherwise only stdout
    /// is piped. The child is killed if the returned handle is dropped before
    /// it exits.
    pub fn launch(&self, inv: &CommandInvocation) -> Result<RunnerProcess> {
        let tokens = self.platform_tokens(inv);
        let command = announce(&tokens);
        let spawn_failed = |source| DriverError::SpawnFailed {
            command: command.clone(),
            source,
        };

        let mut cmd = build_command(&tokens, inv);
        cmd.stdin(Stdio::null()).kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let merged_output = if inv.merge_stderr() {
            let (reader, writer) = std::io::pipe().map_err(spawn_failed)?;
            let err_writer = writer.try_clone().map_err(spawn_failed)?;
            cmd.stdout(writer).stderr(err_writer);
            Some(reader)
        } else {
            cmd.stdout(Stdio::piped());
            None
        };

        let child = cmd.spawn().map_err(spawn_failed)?;
        // The write ends held by `cmd` must close, or the reader never sees
        // end-of-stream.
        drop(cmd);

        debug!(pid = ?child.id(), "runner process started");
        Ok(RunnerProcess {
            child,
            command,
            merged_output,
            windows_family: self.platform.is_windows_family(),
        })
    }

    /// Start `inv` without keeping any pipe or wait on it.
    ///
    /// Returns as soon as the OS reports the process as started. On POSIX the
    /// process gets its own process group so a Ctrl-C aimed at the build does
    /// not reach it.
    pub fn spawn_detached(&self, inv: &CommandInvocation) -> Result<DetachedProcess> {
        let tokens = self.platform_tokens(inv);
        let command = announce(&tokens);

        let mut cmd = build_command(&tokens, inv);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(false);
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn().map_err(|source| DriverError::SpawnFailed {
            command: command.clone(),
            source,
        })?;

        let pid = child.id();
        debug!(?pid, "detached process started; not waiting for it");
        drop(child);

        Ok(DetachedProcess { pid, command })
    }
}

/// Kill a supervised runner together with everything it started.
///
/// POSIX kills the runner's process group; the Windows family asks
/// `taskkill` for the whole tree below the `cmd` wrapper. The direct child
/// is killed and reaped afterwards in either case.
pub async fn terminate_tree(child: &mut Child, windows_family: bool) {
    if let Some(pid) = child.id() {
        if windows_family {
            let result = Command::new("taskkill")
                .args(["/T", "/F", "/PID", &pid.to_string()])
                .stdin(Stdio::null())
                .output()
                .await;
            if let Err(e) = result {
                warn!(pid, error = %e, "failed to run taskkill for the runner tree");
            }
        } else {
            kill_process_group(pid);
        }
    }

    if let Err(e) = child.kill().await {
        warn!(error = %e, "failed to kill runner process");
    }
}

#[cfg(unix)]
fn kill_process_group(pgid: u32) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pgid) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        debug!(pgid, error = %e, "runner process group already gone");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pgid: u32) {}

fn announce(tokens: &[String]) -> String {
    let command = tokens.join(" ");
    info!(command = %command, "executing test runner");
    println!("{command}");
    command
}

fn build_command(tokens: &[String], inv: &CommandInvocation) -> Command {
    let (program, args) = match tokens.split_first() {
        Some((program, args)) => (program.as_str(), args),
        None => ("", &[][..]),
    };

    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = inv.working_dir() {
        cmd.current_dir(dir);
    }
    cmd
}

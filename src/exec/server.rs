// src/exec/server.rs

//! Background server lifecycle for the `startServer` goal.
//!
//! 1. Kill any stale instance of the runner's host process by name. Finding
//!    nothing to kill is fine.
//! 2. Build the `start` invocation with `--no-single-run` forced.
//! 3. Wrap it with the platform's [`DetachStrategy`] and spawn it without
//!    waiting, so the server outlives this process and the build goal.
//!
//! A later `run` goal talks to the server through the runner's own client.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;
use tracing::{debug, info};

use crate::args::FlagSet;
use crate::config::{RunnerConfiguration, ServerSection};
use crate::errors::{DriverError, Result};
use crate::exec::invocation::CommandInvocation;
use crate::exec::launcher::{DetachedProcess, ProcessLauncher};
use crate::platform::{Platform, SharedPlatform};
use crate::types::Goal;

/// Terminates every running process with a given executable name.
///
/// Production code uses [`SystemKiller`]; tests can substitute a recorder.
pub trait StaleProcessKiller: Send + Sync {
    fn kill_all<'a>(
        &'a self,
        process_name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// `taskkill /f /im <name>.exe` on Windows, `killall -v <name>` elsewhere.
#[derive(Debug, Clone)]
pub struct SystemKiller {
    platform: SharedPlatform,
}

impl SystemKiller {
    pub fn new(platform: SharedPlatform) -> Self {
        Self { platform }
    }

    /// The argv used to kill `process_name` on this platform.
    pub fn kill_tokens(&self, process_name: &str) -> Vec<String> {
        if self.platform.is_windows_family() {
            let image = if process_name.to_lowercase().ends_with(".exe") {
                process_name.to_string()
            } else {
                format!("{process_name}.exe")
            };
            ["cmd", "/C", "taskkill", "/f", "/im", image.as_str()]
                .iter()
                .map(|s| s.to_string())
                .collect()
        } else {
            vec![
                "killall".to_string(),
                "-v".to_string(),
                process_name.to_string(),
            ]
        }
    }
}

impl StaleProcessKiller for SystemKiller {
    fn kill_all<'a>(
        &'a self,
        process_name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        let tokens = self.kill_tokens(process_name);

        Box::pin(async move {
            info!(process = %process_name, "stopping stale runner processes");

            let Some((program, args)) = tokens.split_first() else {
                return Ok(());
            };
            let output = Command::new(program)
                .args(args)
                .stdin(Stdio::null())
                .output()
                .await
                .map_err(|source| DriverError::StaleProcessKill {
                    process: process_name.to_string(),
                    source,
                })?;

            // Non-zero usually means nothing matched.
            debug!(
                process = %process_name,
                status = ?output.status,
                stdout = %String::from_utf8_lossy(&output.stdout).trim(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "stale process kill finished"
            );

            Ok(())
        })
    }
}

/// How a server invocation is made to outlive the current process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetachStrategy {
    /// `start "" /min <invocation>` inside the Windows command interpreter.
    MinimizedWindow,
    /// Generated script that backgrounds the invocation with its output sent
    /// to `log_file`, run through a login shell.
    ShellScript {
        script_path: PathBuf,
        log_file: PathBuf,
    },
}

impl DetachStrategy {
    pub fn select(platform: &dyn Platform, server: &ServerSection) -> Self {
        if platform.is_windows_family() {
            DetachStrategy::MinimizedWindow
        } else {
            DetachStrategy::ShellScript {
                script_path: server.script_path.clone(),
                log_file: server.log_file.clone(),
            }
        }
    }

    /// Produce the invocation that, once spawned, starts `inv` detached.
    ///
    /// For [`DetachStrategy::ShellScript`] this writes the script to disk.
    pub fn prepare(&self, inv: &CommandInvocation) -> Result<CommandInvocation> {
        let working_dir = inv.working_dir().map(Path::to_path_buf);

        match self {
            DetachStrategy::MinimizedWindow => {
                // The empty argument is the window title `start` expects first.
                let mut tokens = vec!["start".to_string(), String::new(), "/min".to_string()];
                tokens.extend(inv.tokens().iter().cloned());
                Ok(CommandInvocation::new(tokens, working_dir))
            }
            DetachStrategy::ShellScript {
                script_path,
                log_file,
            } => {
                let script = resolve_against(working_dir.as_deref(), script_path)?;
                let log = resolve_against(working_dir.as_deref(), log_file)?;

                write_launch_script(&script, &render_script(inv, &log))?;

                let tokens = vec![
                    "bash".to_string(),
                    "-l".to_string(),
                    "-c".to_string(),
                    shell_words::quote(&script.display().to_string()).into_owned(),
                ];
                Ok(CommandInvocation::new(tokens, working_dir))
            }
        }
    }
}

/// Script body: the quoted invocation with both streams sent to `log` and
/// the background operator appended.
pub fn render_script(inv: &CommandInvocation, log: &Path) -> String {
    format!(
        "#!/bin/sh\n{} >{} 2>&1 &\n",
        shell_words::join(inv.tokens()),
        shell_words::quote(&log.display().to_string())
    )
}

fn resolve_against(base: Option<&Path>, path: &Path) -> Result<PathBuf> {
    let joined = match base {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    };
    Ok(std::path::absolute(joined)?)
}

fn write_launch_script(path: &Path, body: &str) -> Result<()> {
    fs::write(path, body)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }

    debug!(script = ?path, "wrote server launch script");
    Ok(())
}

/// Kills stale servers and launches a detached watch-mode server.
pub struct ServerManager {
    launcher: ProcessLauncher,
    killer: Arc<dyn StaleProcessKiller>,
}

impl ServerManager {
    pub fn new(launcher: ProcessLauncher, killer: Arc<dyn StaleProcessKiller>) -> Self {
        Self { launcher, killer }
    }

    /// The server invocation before detaching: watch mode is forced.
    pub fn server_invocation(config_file: &Path, cfg: &RunnerConfiguration) -> CommandInvocation {
        CommandInvocation::with_flags(
            Goal::StartServer,
            config_file,
            cfg,
            &["--no-single-run"],
            FlagSet::SERVER,
        )
    }

    /// Returns once the server process has been started; never waits on it.
    pub async fn start(
        &self,
        config_file: &Path,
        cfg: &RunnerConfiguration,
        server: &ServerSection,
    ) -> Result<DetachedProcess> {
        self.killer.kill_all(&server.process_name).await?;

        let inv = Self::server_invocation(config_file, cfg);
        let strategy = DetachStrategy::select(self.launcher.platform().as_ref(), server);
        debug!(?strategy, "selected detach strategy");

        let wrapped = strategy.prepare(&inv)?;
        let detached = self.launcher.spawn_detached(&wrapped)?;

        info!(pid = ?detached.pid, "runner server launched in the background");
        Ok(detached)
    }
}

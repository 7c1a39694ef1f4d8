// src/exec/pump.rs

//! Output pump and outcome decision.
//!
//! The runner's stdout and stderr share one pipe (see
//! [`ProcessLauncher::launch`](crate::exec::ProcessLauncher::launch)); a
//! reader task turns it into a line channel. Draining that channel and
//! waiting for the exit status run as two futures joined with `try_join!`:
//! the pipe keeps being emptied while the child runs, so the child can never
//! block on a full pipe buffer.
//!
//! The whole join races an interrupt future. An interrupt kills the runner's
//! process tree, stops the reader and surfaces as
//! [`DriverError::Interrupted`], never as a test failure.

use std::borrow::Cow;
use std::future::Future;
use std::io::{self, PipeReader};
use std::process::ExitStatus;
use std::sync::LazyLock;

use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{DriverError, Result};
use crate::exec::launcher::{RunnerProcess, terminate_tree};

/// Resets colour and text attributes on ANSI terminals.
pub const ANSI_RESET: &str = "\x1b[0m";

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").expect("ANSI escape pattern is valid")
});

/// How embedded ANSI escape sequences are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Forward lines untouched and reset the terminal when the stream ends.
    Passthrough,
    /// Remove escape sequences before forwarding.
    Strip,
}

impl ColorMode {
    /// Passthrough unless colours were explicitly switched off.
    pub fn for_colors(colors: Option<bool>) -> Self {
        match colors {
            Some(false) => ColorMode::Strip,
            _ => ColorMode::Passthrough,
        }
    }
}

/// How a finished run is turned into a [`RunOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutcomePolicy {
    /// Exit status 0 is success, anything else is failure.
    #[default]
    ExitStatus,
    /// Compatibility shim for runners whose exit status cannot be trusted:
    /// additionally fail when the last non-empty output line contains the
    /// marker. Rewording the runner's summary line silently defeats it.
    FailureMarker(String),
}

impl OutcomePolicy {
    pub fn decide(&self, status_ok: bool, exit_code: Option<i32>, last_line: Option<&str>) -> RunOutcome {
        let marker_hit = match self {
            OutcomePolicy::ExitStatus => false,
            OutcomePolicy::FailureMarker(marker) => {
                last_line.is_some_and(|line| line.contains(marker.as_str()))
            }
        };

        if marker_hit {
            debug!("last output line carries the failure marker");
        }

        RunOutcome {
            success: status_ok && !marker_hit,
            exit_code,
        }
    }
}

/// Result of one run-to-completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub success: bool,
    pub exit_code: Option<i32>,
}

/// Streams runner output to a console writer and decides the outcome.
pub struct OutputPump<W> {
    console: W,
    colors: ColorMode,
    policy: OutcomePolicy,
}

type LineResult = io::Result<String>;

impl<W> OutputPump<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(console: W, colors: ColorMode, policy: OutcomePolicy) -> Self {
        Self {
            console,
            colors,
            policy,
        }
    }

    pub fn into_console(self) -> W {
        self.console
    }

    /// Drain `process` to end-of-stream, wait for its exit and decide.
    pub async fn drain<F>(&mut self, process: RunnerProcess, interrupt: F) -> Result<RunOutcome>
    where
        F: Future<Output = ()>,
    {
        let RunnerProcess {
            mut child,
            command,
            merged_output,
            windows_family,
        } = process;
        let (lines, readers) =
            merge_output(&mut child, merged_output).map_err(DriverError::OutputStream)?;

        let joined = tokio::select! {
            res = async { tokio::try_join!(self.forward(lines), wait_exit(&mut child)) } => res,
            _ = interrupt => {
                warn!(command = %command, "interrupted while waiting for the runner; killing it");
                terminate_tree(&mut child, windows_family).await;
                for reader in &readers {
                    reader.abort();
                }
                Err(DriverError::Interrupted)
            }
        };

        let reset = self.reset_colors().await;

        let (last_line, status) = joined?;
        reset?;

        let outcome = self
            .policy
            .decide(status.success(), status.code(), last_line.as_deref());

        info!(
            exit_code = ?outcome.exit_code,
            success = outcome.success,
            "runner process exited"
        );

        Ok(outcome)
    }

    /// Forward every line; returns the last non-empty one (colours removed).
    async fn forward(&mut self, mut lines: mpsc::Receiver<LineResult>) -> Result<Option<String>> {
        let mut last = None;

        while let Some(line) = lines.recv().await {
            let line = line.map_err(DriverError::OutputStream)?;

            let shown = match self.colors {
                ColorMode::Passthrough => Cow::Borrowed(line.as_str()),
                ColorMode::Strip => strip_ansi(&line),
            };
            self.write_line(&shown).await?;

            let plain = strip_ansi(&line);
            if !plain.trim().is_empty() {
                last = Some(plain.into_owned());
            }
        }

        Ok(last)
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        self.console
            .write_all(line.as_bytes())
            .await
            .map_err(DriverError::OutputStream)?;
        self.console
            .write_all(b"\n")
            .await
            .map_err(DriverError::OutputStream)?;
        self.console.flush().await.map_err(DriverError::OutputStream)
    }

    /// Emitted on every exit path so colour state does not leak into later
    /// build output.
    async fn reset_colors(&mut self) -> Result<()> {
        if self.colors != ColorMode::Passthrough {
            return Ok(());
        }
        self.console
            .write_all(ANSI_RESET.as_bytes())
            .await
            .map_err(DriverError::OutputStream)?;
        self.console.flush().await.map_err(DriverError::OutputStream)
    }
}

/// Remove ANSI CSI escape sequences.
pub fn strip_ansi(line: &str) -> Cow<'_, str> {
    ANSI_ESCAPE.replace_all(line, "")
}

async fn wait_exit(child: &mut Child) -> Result<ExitStatus> {
    let status = child.wait().await?;
    debug!(?status, "runner exit status observed");
    Ok(status)
}

/// One line channel over the child's output.
///
/// The merged pipe is used when present; separately piped stdout/stderr
/// handles are read as well. The channel closes once every source reaches
/// end-of-stream.
fn merge_output(
    child: &mut Child,
    merged: Option<PipeReader>,
) -> io::Result<(mpsc::Receiver<LineResult>, Vec<JoinHandle<()>>)> {
    let (tx, rx) = mpsc::channel::<LineResult>(64);
    let mut readers = Vec::new();

    if let Some(reader) = merged {
        readers.push(spawn_pipe_reader(reader, tx.clone())?);
    }
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_line_reader("stdout", stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_line_reader("stderr", stderr, tx.clone()));
    }

    Ok((rx, readers))
}

#[cfg(unix)]
fn spawn_pipe_reader(reader: PipeReader, tx: mpsc::Sender<LineResult>) -> io::Result<JoinHandle<()>> {
    use std::os::fd::OwnedFd;
    use tokio::net::unix::pipe;

    let receiver = pipe::Receiver::from_owned_fd(OwnedFd::from(reader))?;
    Ok(spawn_line_reader("merged", receiver, tx))
}

#[cfg(not(unix))]
fn spawn_pipe_reader(reader: PipeReader, tx: mpsc::Sender<LineResult>) -> io::Result<JoinHandle<()>> {
    use std::io::BufRead;

    Ok(tokio::task::spawn_blocking(move || {
        let mut reader = std::io::BufReader::new(reader);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(trim_newline(&buf)).into_owned();
                    if tx.blocking_send(Ok(line)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.blocking_send(Err(e));
                    break;
                }
            }
        }

        debug!(stream = "merged", "runner output stream ended");
    }))
}

fn spawn_line_reader<R>(stream: &'static str, reader: R, tx: mpsc::Sender<LineResult>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(trim_newline(&buf)).into_owned();
                    if tx.send(Ok(line)).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    break;
                }
            }
        }

        debug!(stream, "runner output stream ended");
    })
}

fn trim_newline(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}

/// Resolves when the user presses Ctrl-C.
///
/// If the signal handler cannot be installed this never resolves.
pub async fn ctrl_c_interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

//! Stand-ins for the real runner executable and process killer.

#![allow(dead_code)]

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use karma_driver::errors::Result;
use karma_driver::exec::StaleProcessKiller;

/// Writes small `sh` scripts that behave like the runner: print some lines,
/// optionally sleep, then exit with a chosen code.
///
/// Output steps run in the order they were added. Every script also records
/// the arguments it was started with in `<name>.args`, one per line.
pub struct FakeRunner {
    steps: Vec<Step>,
    exit_code: i32,
    sleep_secs: Option<u32>,
}

enum Step {
    Stdout(String),
    Stderr(String),
    /// `lines` lines of 128 characters on stdout, then as many on stderr.
    Flood { lines: usize },
    /// Background job that creates `path` after `delay_secs`.
    TouchLater { delay_secs: u32, path: PathBuf },
}

fn sh_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            exit_code: 0,
            sleep_secs: None,
        }
    }

    pub fn prints(mut self, line: &str) -> Self {
        self.steps.push(Step::Stdout(line.to_string()));
        self
    }

    pub fn prints_stderr(mut self, line: &str) -> Self {
        self.steps.push(Step::Stderr(line.to_string()));
        self
    }

    pub fn floods(mut self, lines: usize) -> Self {
        self.steps.push(Step::Flood { lines });
        self
    }

    /// Leaves a background job behind that touches `path` later, unless it
    /// is killed first.
    pub fn touches_later(mut self, delay_secs: u32, path: impl Into<PathBuf>) -> Self {
        self.steps.push(Step::TouchLater {
            delay_secs,
            path: path.into(),
        });
        self
    }

    pub fn exits_with(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    pub fn sleeps(mut self, secs: u32) -> Self {
        self.sleep_secs = Some(secs);
        self
    }

    /// Write the script as `dir/name` and make it executable.
    pub fn write(&self, dir: &Path, name: &str) -> std::io::Result<PathBuf> {
        let path = dir.join(name);
        let args_file = args_file_for(&path);

        let mut body = String::from("#!/bin/sh\n");
        body.push_str(&format!(
            "for a in \"$@\"; do printf '%s\\n' \"$a\"; done > {}\n",
            sh_quote(&args_file.display().to_string())
        ));
        for step in &self.steps {
            match step {
                Step::Stdout(line) => {
                    body.push_str(&format!("printf '%s\\n' {}\n", sh_quote(line)));
                }
                Step::Stderr(line) => {
                    body.push_str(&format!("printf '%s\\n' {} >&2\n", sh_quote(line)));
                }
                Step::Flood { lines } => {
                    let filler = "x".repeat(128);
                    body.push_str(&format!("yes {filler} | head -n {lines}\n"));
                    body.push_str(&format!("yes {filler} | head -n {lines} >&2\n"));
                }
                Step::TouchLater { delay_secs, path } => {
                    body.push_str(&format!(
                        "(sleep {delay_secs}; touch {}) &\n",
                        sh_quote(&path.display().to_string())
                    ));
                }
            }
        }
        if let Some(secs) = self.sleep_secs {
            body.push_str(&format!("sleep {secs}\n"));
        }
        body.push_str(&format!("exit {}\n", self.exit_code));

        fs::write(&path, body)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        }

        Ok(path)
    }
}

impl Default for FakeRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a script written by [`FakeRunner::write`] records its arguments.
pub fn args_file_for(script: &Path) -> PathBuf {
    let mut name = script.file_name().unwrap_or_default().to_os_string();
    name.push(".args");
    script.with_file_name(name)
}

/// The arguments a fake runner script was started with, if it ran.
pub fn recorded_args(script: &Path) -> Option<Vec<String>> {
    fs::read_to_string(args_file_for(script))
        .ok()
        .map(|s| s.lines().map(|l| l.to_string()).collect())
}

/// A killer that only records the process names it was asked to kill.
#[derive(Clone, Default)]
pub struct RecordingKiller {
    pub killed: Arc<Mutex<Vec<String>>>,
}

impl RecordingKiller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.killed.lock().unwrap().clone()
    }
}

impl StaleProcessKiller for RecordingKiller {
    fn kill_all<'a>(
        &'a self,
        process_name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        let killed = Arc::clone(&self.killed);
        Box::pin(async move {
            killed.lock().unwrap().push(process_name.to_string());
            Ok(())
        })
    }
}

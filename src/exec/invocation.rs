// src/exec/invocation.rs

//! The command line handed to the process launcher.

use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use crate::args::{FlagSet, build_flag_tokens};
use crate::config::{DEFAULT_EXECUTABLE, RunnerConfiguration};
use crate::types::Goal;

/// Executable plus arguments, built once per goal execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    tokens: Vec<String>,
    working_dir: Option<PathBuf>,
    merge_stderr: bool,
}

impl CommandInvocation {
    pub fn new(tokens: Vec<String>, working_dir: Option<PathBuf>) -> Self {
        Self {
            tokens,
            working_dir,
            merge_stderr: true,
        }
    }

    /// `<exe> <start|run> <config> [flag tokens...]` for the given goal.
    pub fn for_goal(goal: Goal, config_file: &Path, cfg: &RunnerConfiguration) -> Self {
        Self::with_flags(goal, config_file, cfg, &[], FlagSet::for_goal(goal))
    }

    /// Like [`CommandInvocation::for_goal`] but with `leading` tokens placed
    /// right after the config path and an explicit flag subset.
    pub fn with_flags(
        goal: Goal,
        config_file: &Path,
        cfg: &RunnerConfiguration,
        leading: &[&str],
        flags: FlagSet,
    ) -> Self {
        let mut tokens = vec![
            normalize_executable(cfg.executable()),
            goal.runner_subcommand().to_string(),
            config_file.display().to_string(),
        ];
        tokens.extend(leading.iter().map(|s| s.to_string()));
        tokens.extend(build_flag_tokens(cfg, flags));

        Self::new(tokens, cfg.working_directory.clone())
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn program(&self) -> &str {
        self.tokens.first().map(String::as_str).unwrap_or_default()
    }

    pub fn args(&self) -> &[String] {
        self.tokens.get(1..).unwrap_or_default()
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn merge_stderr(&self) -> bool {
        self.merge_stderr
    }

    /// Space-joined rendering, for display only.
    pub fn render(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Rewrite `/` and `\` to the host separator for explicit executable paths.
///
/// The bare default name is left alone so the search path resolves it.
fn normalize_executable(exe: &str) -> String {
    if exe == DEFAULT_EXECUTABLE {
        return exe.to_string();
    }
    exe.chars()
        .map(|c| if c == '/' || c == '\\' { MAIN_SEPARATOR } else { c })
        .collect()
}

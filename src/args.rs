// src/args.rs

//! Runner configuration → command-line flag tokens.
//!
//! This is the single place that knows how each [`RunnerConfiguration`]
//! field is spelled on the runner's command line. It is pure: the same
//! configuration and flag set always produce the same tokens, in the same
//! order:
//!
//! browsers, reporters, single-run, auto-watch, capture-timeout,
//! report-slower-than, colors
//!
//! A field that is `None` contributes no tokens at all.

use crate::config::RunnerConfiguration;
use crate::types::Goal;

/// Which configuration fields a goal forwards to the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagSet {
    pub browsers: bool,
    pub reporters: bool,
    pub single_run: bool,
    pub auto_watch: bool,
    pub capture_timeout: bool,
    pub report_slower_than: bool,
    pub colors: bool,
}

impl FlagSet {
    pub const ALL: FlagSet = FlagSet {
        browsers: true,
        reporters: true,
        single_run: true,
        auto_watch: true,
        capture_timeout: true,
        report_slower_than: true,
        colors: true,
    };

    pub const NONE: FlagSet = FlagSet {
        browsers: false,
        reporters: false,
        single_run: false,
        auto_watch: false,
        capture_timeout: false,
        report_slower_than: false,
        colors: false,
    };

    /// The background server forces watch mode itself and never overrides
    /// colours.
    pub const SERVER: FlagSet = FlagSet {
        single_run: false,
        colors: false,
        ..FlagSet::ALL
    };

    pub fn for_goal(goal: Goal) -> FlagSet {
        match goal {
            Goal::Start => FlagSet::ALL,
            Goal::StartServer => FlagSet::SERVER,
            Goal::Run => FlagSet::NONE,
        }
    }
}

/// Build the ordered flag tokens for `cfg`, restricted to `flags`.
pub fn build_flag_tokens(cfg: &RunnerConfiguration, flags: FlagSet) -> Vec<String> {
    let mut tokens = Vec::new();

    if flags.browsers {
        push_list(&mut tokens, "--browsers", cfg.browsers.as_deref());
    }
    if flags.reporters {
        push_list(&mut tokens, "--reporters", cfg.reporters.as_deref());
    }
    if flags.single_run {
        push_switch(&mut tokens, cfg.single_run, "--single-run", "--no-single-run");
    }
    if flags.auto_watch {
        push_switch(&mut tokens, cfg.auto_watch, "--auto-watch", "--no-auto-watch");
    }
    if flags.capture_timeout {
        push_value(&mut tokens, "--capture-timeout", cfg.capture_timeout);
    }
    if flags.report_slower_than {
        push_value(&mut tokens, "--report-slower-than", cfg.report_slower_than);
    }
    if flags.colors {
        push_value(&mut tokens, "--colors", cfg.colors);
    }

    tokens
}

/// Tri-state boolean with a dedicated switch for each value.
fn push_switch(tokens: &mut Vec<String>, value: Option<bool>, on: &str, off: &str) {
    if let Some(v) = value {
        tokens.push(if v { on } else { off }.to_string());
    }
}

/// Single-valued field: flag name followed by the stringified value.
fn push_value<T: ToString>(tokens: &mut Vec<String>, flag: &str, value: Option<T>) {
    if let Some(v) = value {
        tokens.push(flag.to_string());
        tokens.push(v.to_string());
    }
}

// Empty lists count as unset.
fn push_list(tokens: &mut Vec<String>, flag: &str, values: Option<&[String]>) {
    if let Some(values) = values.filter(|v| !v.is_empty()) {
        tokens.push(flag.to_string());
        tokens.push(values.join(","));
    }
}

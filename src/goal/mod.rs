// src/goal/mod.rs

//! Goal orchestration.
//!
//! - [`request`] resolves CLI arguments and the settings file into a
//!   read-only [`GoalRequest`].
//! - [`orchestrator`] drives one request through the run phases and applies
//!   the failure policy.

pub mod orchestrator;
pub mod request;

pub use orchestrator::{GoalRunner, GoalVerdict, RunPhase, apply_failure_policy};
pub use request::{GoalRequest, SkipFlags};

// src/exit_codes.rs

//! Process exit codes reported to the invoking build.
//!
//! - 0: success (including skipped goals, ignored failures, started servers)
//! - 1: the runner reported test failures
//! - 2: the runner could not be executed (environment/execution error)

use crate::errors::{DriverError, ErrorKind};

pub const SUCCESS: i32 = 0;

pub const TEST_FAILURE: i32 = 1;

pub const ENVIRONMENT_ERROR: i32 = 2;

pub fn for_error(err: &DriverError) -> i32 {
    match err.kind() {
        ErrorKind::TestFailure => TEST_FAILURE,
        ErrorKind::Environment => ENVIRONMENT_ERROR,
    }
}

// src/platform.rs

//! Host platform capability.
//!
//! Everything that behaves differently on Windows (command interpreter
//! wrapping, stale process termination, detached launch) asks a `Platform`
//! instead of checking `cfg!(windows)` inline, so tests can exercise both
//! families on any host.

use std::fmt::Debug;
use std::sync::Arc;

pub trait Platform: Send + Sync + Debug {
    fn is_windows_family(&self) -> bool;
}

/// The platform this binary was compiled for.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostPlatform;

impl Platform for HostPlatform {
    fn is_windows_family(&self) -> bool {
        cfg!(windows)
    }
}

/// A platform with a fixed answer, used to simulate either family.
#[derive(Debug, Clone, Copy)]
pub struct FixedPlatform {
    pub windows: bool,
}

impl FixedPlatform {
    pub fn windows() -> Self {
        Self { windows: true }
    }

    pub fn posix() -> Self {
        Self { windows: false }
    }
}

impl Platform for FixedPlatform {
    fn is_windows_family(&self) -> bool {
        self.windows
    }
}

pub type SharedPlatform = Arc<dyn Platform>;

pub fn host() -> SharedPlatform {
    Arc::new(HostPlatform)
}

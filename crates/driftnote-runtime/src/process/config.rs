//! Per-service supervision configuration.

use driftnote_core::ServiceKind;
use std::path::PathBuf;
use std::time::Duration;

/// How a supervisor decides a freshly spawned child is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Poll the authenticated HTTP health endpoint until it answers 200
    /// or the deadline passes.
    HttpHealth {
        /// Delay between consecutive probes.
        poll_interval: Duration,
        /// Total budget before the start is declared failed.
        timeout: Duration,
    },
    /// Wait a fixed delay, then require the child to still be alive.
    ///
    /// Used for stdio services with no network surface to probe.
    GraceDelay {
        /// How long to wait before the liveness check.
        delay: Duration,
    },
}

/// Manual launch plan used by tests to substitute a real service binary.
#[derive(Debug, Clone)]
pub struct LaunchOverride {
    /// Program to execute instead of the resolved service command.
    pub program: PathBuf,
    /// Arguments passed verbatim.
    pub args: Vec<String>,
    /// Working directory; defaults to the process cwd when `None`.
    pub cwd: Option<PathBuf>,
}

/// Static configuration for one supervised service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Which service this supervisor runs.
    pub kind: ServiceKind,
    /// Readiness gate applied after spawn.
    pub readiness: Readiness,
    /// Grace period granted to the child between SIGTERM and SIGKILL.
    pub stop_grace: Duration,
    /// Test hook replacing command resolution entirely.
    pub launch_override: Option<LaunchOverride>,
}

impl ServiceConfig {
    /// Configuration for the HTTP backend service.
    #[must_use]
    pub const fn backend() -> Self {
        Self {
            kind: ServiceKind::Backend,
            readiness: Readiness::HttpHealth {
                poll_interval: Duration::from_millis(250),
                timeout: Duration::from_secs(10),
            },
            stop_grace: Duration::from_secs(5),
            launch_override: None,
        }
    }

    /// Configuration for the stdio bridge service.
    #[must_use]
    pub const fn bridge() -> Self {
        Self {
            kind: ServiceKind::Bridge,
            readiness: Readiness::GraceDelay {
                delay: Duration::from_millis(500),
            },
            stop_grace: Duration::from_secs(5),
            launch_override: None,
        }
    }

    /// Replace the launch plan with a fixed command (tests).
    #[must_use]
    pub fn with_launch_override(mut self, launch: LaunchOverride) -> Self {
        self.launch_override = Some(launch);
        self
    }

    /// Shrink the readiness gate's timings (tests).
    #[must_use]
    pub const fn with_readiness(mut self, readiness: Readiness) -> Self {
        self.readiness = readiness;
        self
    }
}

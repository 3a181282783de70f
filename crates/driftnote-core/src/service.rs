//! Supervised service identity and lifecycle state.
//!
//! One `ServiceState` exists per supervised service for the lifetime of the
//! application. The frontend should treat broadcast snapshots of this state
//! as the sole source of truth for service lifecycle.

use serde::{Deserialize, Serialize};

/// Identity of a supervised auxiliary service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// The local HTTP data/API service (port + token authenticated).
    Backend,
    /// The tool-protocol service speaking over stdin/stdout.
    Bridge,
}

impl ServiceKind {
    /// Human-readable name used in logs and CLI output.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Backend => "backend",
            Self::Bridge => "bridge",
        }
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Lifecycle status of a supervised service.
///
/// Transitions: `Stopped → Starting → Running → Stopping → Stopped`.
/// `Starting` and `Running` may fall into `Error`; `Error` behaves like
/// `Stopped` for the purposes of the next `start()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Stopped,
    Starting,
    Running,
    Stopping,
    Error,
}

impl ServiceStatus {
    /// True while the service owns (or is acquiring) a live child process.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Starting | Self::Running | Self::Stopping)
    }
}

/// Full state snapshot for one supervised service.
///
/// `port` and `token` are only populated for the backend service and are
/// only meaningful while `status` is `Starting` or `Running`; every
/// transition back to `Stopped` or `Error` clears them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceState {
    /// Current lifecycle status.
    pub status: ServiceStatus,
    /// OS process id of the live child, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// Local port the backend listens on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Per-run request token for the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Unix timestamp in milliseconds when the last start began.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<u64>,
    /// Exit code from the most recent child exit, when one was reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_exit_code: Option<i32>,
    /// Signal name that terminated the most recent child, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_signal: Option<String>,
    /// Message describing the most recent failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl ServiceState {
    /// Initial state at application startup.
    #[must_use]
    pub const fn stopped() -> Self {
        Self {
            status: ServiceStatus::Stopped,
            pid: None,
            port: None,
            token: None,
            started_at: None,
            last_exit_code: None,
            last_signal: None,
            last_error: None,
        }
    }

    /// Clear every field tied to a live child process.
    ///
    /// Called on every transition into `Stopped` or `Error` so that stale
    /// pids, ports and tokens can never be observed alongside a dead child.
    pub fn clear_resources(&mut self) {
        self.pid = None;
        self.port = None;
        self.token = None;
        self.started_at = None;
    }
}

impl Default for ServiceState {
    fn default() -> Self {
        Self::stopped()
    }
}

/// Severity of a streamed log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// A single log line captured from a supervised child process.
///
/// Ephemeral: entries flow through the broadcaster and a bounded recent
/// window; nothing is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Severity, derived from the originating stream.
    pub level: LogLevel,
    /// The log line content (without trailing newline).
    pub message: String,
    /// Unix timestamp in milliseconds when the line was captured.
    pub timestamp: u64,
}

impl LogEntry {
    /// Create a new entry stamped with the current time.
    #[must_use]
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: crate::now_ms(),
        }
    }
}

//! Core domain types, events and port definitions for driftnote.
//!
//! This crate carries no adapter-specific dependencies: it defines the
//! shapes that cross the boundary between the supervision runtime and its
//! observers (service state snapshots, log entries, runtime discovery
//! results), the port traits those observers implement, and the path
//! resolution shared by every component.

pub mod events;
pub mod paths;
pub mod ports;
pub mod runtime;
pub mod service;

// Re-export commonly used types for convenience
pub use events::AppEvent;
pub use paths::{PathError, data_root, dev_service_dir, is_prebuilt_binary, log_dir, resource_root};
pub use ports::{EventEmitter, NoopEmitter, ServiceLogSink};
pub use runtime::{ExecutableId, ExecutableLocation, RuntimeStatus};
pub use service::{LogEntry, LogLevel, ServiceKind, ServiceState, ServiceStatus};

/// Current time as Unix milliseconds.
///
/// Single timestamp helper so snapshots and log entries agree on units.
#[must_use]
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

//! Application events for real-time state synchronization.
//!
//! These events are emitted by the supervision core and consumed by the
//! UI layer to maintain a synchronized view of service state. Observers
//! should treat them as the sole source of truth: every event carries the
//! full current snapshot, never a diff.

use serde::{Deserialize, Serialize};

use crate::runtime::RuntimeStatus;
use crate::service::{LogEntry, ServiceKind, ServiceState};

/// Event payload fanned out to all registered observers.
///
/// Notifications for a single service are delivered in mutation order; no
/// ordering is guaranteed across services, nor between a log line and the
/// state transition it may have triggered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AppEvent {
    /// Full state snapshot after a committed mutation.
    #[serde(rename_all = "camelCase")]
    ServiceState {
        service: ServiceKind,
        state: ServiceState,
    },

    /// One complete log line from a service's stdout or stderr.
    #[serde(rename_all = "camelCase")]
    ServiceLog {
        service: ServiceKind,
        entry: LogEntry,
    },

    /// Result of a completed runtime discovery pass.
    #[serde(rename_all = "camelCase")]
    RuntimeStatus { status: RuntimeStatus },
}

impl AppEvent {
    /// Create a service state snapshot event.
    pub const fn service_state(service: ServiceKind, state: ServiceState) -> Self {
        Self::ServiceState { service, state }
    }

    /// Create a service log event.
    pub const fn service_log(service: ServiceKind, entry: LogEntry) -> Self {
        Self::ServiceLog { service, entry }
    }

    /// Create a runtime status event.
    pub const fn runtime_status(status: RuntimeStatus) -> Self {
        Self::RuntimeStatus { status }
    }
}

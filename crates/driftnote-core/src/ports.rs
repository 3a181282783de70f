//! Port traits decoupling the supervision core from its transports.
//!
//! Implementations handle delivery details (broadcast channels, desktop
//! event bridges, test capture) so channel types never become part of the
//! public API surface.

use crate::events::AppEvent;
use crate::service::{LogEntry, ServiceKind};

/// Port for emitting application events to observers.
///
/// Implementations must not block: the supervisor calls `emit` synchronously
/// at every committed state mutation.
pub trait EventEmitter: Send + Sync {
    /// Emit an application event.
    fn emit(&self, event: AppEvent);
}

/// Port for appending captured child-process log lines to a sink.
///
/// Implementations should be thread-safe; reader tasks call `append` from
/// their own tasks as lines arrive.
pub trait ServiceLogSink: Send + Sync {
    /// Append one complete log line from a supervised service.
    fn append(&self, service: ServiceKind, entry: LogEntry);
}

/// An emitter that discards all events.
///
/// Suitable for unit tests and CLI contexts without an event listener.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    /// Create a new no-op emitter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl EventEmitter for NoopEmitter {
    fn emit(&self, _event: AppEvent) {
        // Intentionally do nothing
    }
}

impl ServiceLogSink for NoopEmitter {
    fn append(&self, _service: ServiceKind, _entry: LogEntry) {
        // Intentionally do nothing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{LogLevel, ServiceState};
    use std::sync::Arc;

    #[test]
    fn noop_emitter_accepts_events() {
        let emitter = NoopEmitter::new();
        emitter.emit(AppEvent::service_state(
            ServiceKind::Backend,
            ServiceState::stopped(),
        ));
        emitter.append(ServiceKind::Bridge, LogEntry::new(LogLevel::Info, "x"));
    }

    #[test]
    fn noop_emitter_as_trait_object() {
        let emitter: Arc<dyn EventEmitter> = Arc::new(NoopEmitter::new());
        emitter.emit(AppEvent::service_state(
            ServiceKind::Bridge,
            ServiceState::stopped(),
        ));
    }
}

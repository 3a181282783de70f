//! Application event fan-out.
//!
//! A single broadcast channel carries every service state change, log line
//! and runtime discovery result. Emission is fire-and-forget: with no
//! subscribers the send fails silently, and a slow subscriber that lags
//! past the channel capacity loses the oldest events, never blocking the
//! supervisors.

use driftnote_core::{AppEvent, EventEmitter, LogEntry, ServiceKind, ServiceLogSink};
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use tokio::sync::broadcast;
use tracing::trace;

const CHANNEL_CAPACITY: usize = 256;

/// Per-service count of retained recent log lines.
const RECENT_LOG_CAPACITY: usize = 500;

/// Broadcast hub for application events, plus a bounded window of recent
/// log lines per service for late-joining observers.
pub struct EventBroadcaster {
    sender: broadcast::Sender<AppEvent>,
    recent: RwLock<HashMap<ServiceKind, VecDeque<LogEntry>>>,
}

impl EventBroadcaster {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            recent: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribe to all events from this point forward.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// The retained recent log lines for one service, oldest first.
    #[must_use]
    pub fn recent_logs(&self, service: ServiceKind) -> Vec<LogEntry> {
        self.recent
            .read()
            .expect("recent log window poisoned")
            .get(&service)
            .map(|window| window.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn send(&self, event: AppEvent) {
        // Err means no subscriber is currently listening
        let _ = self.sender.send(event);
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl EventEmitter for EventBroadcaster {
    fn emit(&self, event: AppEvent) {
        trace!(?event, "broadcasting event");
        self.send(event);
    }
}

impl ServiceLogSink for EventBroadcaster {
    fn append(&self, service: ServiceKind, entry: LogEntry) {
        {
            let mut recent = self.recent.write().expect("recent log window poisoned");
            let window = recent.entry(service).or_default();
            if window.len() >= RECENT_LOG_CAPACITY {
                window.pop_front();
            }
            window.push_back(entry.clone());
        }
        self.send(AppEvent::service_log(service, entry));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftnote_core::{LogLevel, ServiceState};

    #[tokio::test]
    async fn subscribers_receive_emitted_events() {
        let broadcaster = EventBroadcaster::new();
        let mut rx = broadcaster.subscribe();

        broadcaster.emit(AppEvent::service_state(
            ServiceKind::Backend,
            ServiceState::stopped(),
        ));

        match rx.recv().await.unwrap() {
            AppEvent::ServiceState { service, .. } => assert_eq!(service, ServiceKind::Backend),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn emit_without_subscribers_is_silent() {
        let broadcaster = EventBroadcaster::new();
        broadcaster.emit(AppEvent::service_state(
            ServiceKind::Bridge,
            ServiceState::stopped(),
        ));
    }

    #[tokio::test]
    async fn log_entries_reach_subscribers_and_window() {
        let broadcaster = EventBroadcaster::new();
        let mut rx = broadcaster.subscribe();

        broadcaster.append(ServiceKind::Bridge, LogEntry::new(LogLevel::Info, "hello"));

        match rx.recv().await.unwrap() {
            AppEvent::ServiceLog { service, entry } => {
                assert_eq!(service, ServiceKind::Bridge);
                assert_eq!(entry.message, "hello");
            }
            other => panic!("unexpected event: {other:?}"),
        }

        let recent = broadcaster.recent_logs(ServiceKind::Bridge);
        assert_eq!(recent.len(), 1);
        assert!(broadcaster.recent_logs(ServiceKind::Backend).is_empty());
    }

    #[test]
    fn recent_window_is_bounded() {
        let broadcaster = EventBroadcaster::new();
        for i in 0..(RECENT_LOG_CAPACITY + 25) {
            broadcaster.append(
                ServiceKind::Backend,
                LogEntry::new(LogLevel::Info, format!("line {i}")),
            );
        }
        let recent = broadcaster.recent_logs(ServiceKind::Backend);
        assert_eq!(recent.len(), RECENT_LOG_CAPACITY);
        assert_eq!(recent[0].message, "line 25");
    }
}

//! Composition root wiring discovery, supervision and the backend client.

use anyhow::{Context, Result};
use driftnote_core::{AppEvent, LogEntry, RuntimeStatus, ServiceKind, ServiceState};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

use crate::client::{BackendClient, ClientError};
use crate::discovery::RuntimeDiscovery;
use crate::process::{EventBroadcaster, ServiceConfig, ServiceSupervisor};

/// Owns every long-lived supervision component.
///
/// Constructed once at application startup and shared behind an `Arc`;
/// there are no module-level globals, so tests can build as many isolated
/// managers as they need.
pub struct ServiceManager {
    broadcaster: Arc<EventBroadcaster>,
    discovery: Arc<RuntimeDiscovery>,
    backend: Arc<ServiceSupervisor>,
    bridge: Arc<ServiceSupervisor>,
    client: BackendClient,
}

impl ServiceManager {
    #[must_use]
    pub fn new() -> Self {
        Self::with_configs(ServiceConfig::backend(), ServiceConfig::bridge())
    }

    /// Build a manager with explicit service configs (tests use launch
    /// overrides and shortened readiness gates).
    #[must_use]
    pub fn with_configs(backend: ServiceConfig, bridge: ServiceConfig) -> Self {
        let broadcaster = Arc::new(EventBroadcaster::new());
        let discovery = Arc::new(RuntimeDiscovery::new(broadcaster.clone()));

        let backend = Arc::new(ServiceSupervisor::new(
            backend,
            discovery.clone(),
            broadcaster.clone(),
            broadcaster.clone(),
        ));
        let bridge = Arc::new(ServiceSupervisor::new(
            bridge,
            discovery.clone(),
            broadcaster.clone(),
            broadcaster.clone(),
        ));
        let client = BackendClient::new(backend.clone());

        Self {
            broadcaster,
            discovery,
            backend,
            bridge,
            client,
        }
    }

    fn supervisor(&self, kind: ServiceKind) -> &Arc<ServiceSupervisor> {
        match kind {
            ServiceKind::Backend => &self.backend,
            ServiceKind::Bridge => &self.bridge,
        }
    }

    /// Start one service, resolving to its settled state.
    pub async fn start(&self, kind: ServiceKind) -> ServiceState {
        self.supervisor(kind).start().await
    }

    /// Stop one service, resolving once its child is gone.
    pub async fn stop(&self, kind: ServiceKind) -> ServiceState {
        self.supervisor(kind).stop().await
    }

    /// Current snapshot for one service.
    #[must_use]
    pub fn state(&self, kind: ServiceKind) -> ServiceState {
        self.supervisor(kind).state()
    }

    /// On-demand health probe for one service.
    pub async fn check_health(&self, kind: ServiceKind) -> bool {
        self.supervisor(kind).check_health().await
    }

    /// Run (or join) a runtime discovery pass.
    pub async fn discover_runtime(&self) -> RuntimeStatus {
        self.discovery.discover().await
    }

    /// Last completed discovery result, if any.
    #[must_use]
    pub fn runtime_status(&self) -> Option<RuntimeStatus> {
        self.discovery.current()
    }

    /// Proxy one JSON request to the backend.
    ///
    /// `method` is parsed case-insensitively ("get", "POST", ...).
    pub async fn request_json(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value> {
        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .with_context(|| format!("invalid HTTP method: {method}"))?;
        self.client
            .request(method, path, body)
            .await
            .map_err(anyhow::Error::from)
    }

    /// Direct access to the typed client for callers that want
    /// [`ClientError`] granularity.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ClientError> {
        self.client.request(method, path, body).await
    }

    /// Subscribe to all application events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.broadcaster.subscribe()
    }

    /// Recent log lines retained for one service, oldest first.
    #[must_use]
    pub fn recent_logs(&self, kind: ServiceKind) -> Vec<LogEntry> {
        self.broadcaster.recent_logs(kind)
    }

    /// Stop both services. Bounded by each supervisor's stop grace.
    pub async fn shutdown(&self) {
        info!("shutting down supervised services");
        let (backend, bridge) = tokio::join!(self.backend.stop(), self.bridge.stop());
        info!(
            backend = ?backend.status,
            bridge = ?bridge.status,
            "supervised services shut down"
        );
    }
}

impl Default for ServiceManager {
    fn default() -> Self {
        Self::new()
    }
}

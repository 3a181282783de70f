//! Authenticated JSON client for the supervised backend.
//!
//! The backend's port and token are issued fresh on every start, so the
//! client never holds a base URL: each request reads the supervisor's
//! current snapshot and refuses to fire unless the service is Running.

use driftnote_core::ServiceStatus;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::process::{ServiceSupervisor, TOKEN_HEADER};

/// Errors surfaced by [`BackendClient::request`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The backend is not running or has no recorded port/token.
    #[error("backend service is not running")]
    NotRunning,

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The response body was non-empty but not valid JSON.
    #[error("backend returned invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The request never completed (connect error, timeout, ...).
    #[error("request to backend failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Proxy for frontend-originated requests to the backend service.
pub struct BackendClient {
    supervisor: Arc<ServiceSupervisor>,
    http: reqwest::Client,
}

impl BackendClient {
    #[must_use]
    pub fn new(supervisor: Arc<ServiceSupervisor>) -> Self {
        Self {
            supervisor,
            http: reqwest::Client::new(),
        }
    }

    /// Send one authenticated JSON request to the backend.
    ///
    /// `path` must start with `/`. An empty success body resolves to
    /// `Value::Null`; a non-empty body must parse as JSON. Non-2xx
    /// responses surface status and body verbatim.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ClientError> {
        let snapshot = self.supervisor.state();
        if snapshot.status != ServiceStatus::Running {
            return Err(ClientError::NotRunning);
        }
        let (Some(port), Some(token)) = (snapshot.port, snapshot.token) else {
            return Err(ClientError::NotRunning);
        };

        let url = format!("http://127.0.0.1:{port}{path}");
        debug!(%method, %url, "proxying backend request");

        let mut request = self.http.request(method, &url).header(TOKEN_HEADER, token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ClientError::Status { status, body: text });
        }
        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::RuntimeDiscovery;
    use crate::process::ServiceConfig;
    use driftnote_core::{NoopEmitter, ServiceState};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn backend_supervisor() -> Arc<ServiceSupervisor> {
        let emitter = Arc::new(NoopEmitter::new());
        let discovery = Arc::new(RuntimeDiscovery::new(emitter.clone()));
        Arc::new(ServiceSupervisor::new(
            ServiceConfig::backend(),
            discovery,
            emitter.clone(),
            emitter,
        ))
    }

    /// Serve the given raw HTTP response to every connection on a local
    /// ephemeral port.
    async fn spawn_responder(response: &'static str) -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 2048];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        port
    }

    /// Client wired to a supervisor that believes the backend runs on `port`.
    fn running_client(port: u16) -> BackendClient {
        let supervisor = backend_supervisor();
        let mut state = ServiceState::stopped();
        state.status = ServiceStatus::Running;
        state.port = Some(port);
        state.token = Some("test-token".to_string());
        supervisor.set_state(state);
        BackendClient::new(supervisor)
    }

    #[tokio::test]
    async fn refuses_when_not_running() {
        let client = BackendClient::new(backend_supervisor());
        let result = client.request(Method::GET, "/api/notes", None).await;
        assert!(matches!(result, Err(ClientError::NotRunning)));
    }

    #[tokio::test]
    async fn empty_success_body_resolves_to_null() {
        let port = spawn_responder(
            "HTTP/1.1 204 No Content\r\nconnection: close\r\n\r\n",
        )
        .await;
        let client = running_client(port);

        let value = client.request(Method::GET, "/api/notes", None).await.unwrap();
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn json_success_body_is_parsed() {
        let port = spawn_responder(
            "HTTP/1.1 200 OK\r\ncontent-length: 13\r\nconnection: close\r\n\r\n{\"count\":42}\n",
        )
        .await;
        let client = running_client(port);

        let value = client.request(Method::GET, "/api/notes", None).await.unwrap();
        assert_eq!(value["count"], 42);
    }

    #[tokio::test]
    async fn error_status_surfaces_status_and_body() {
        let port = spawn_responder(
            "HTTP/1.1 404 Not Found\r\ncontent-length: 9\r\nconnection: close\r\n\r\nnot found",
        )
        .await;
        let client = running_client(port);

        match client.request(Method::GET, "/api/missing", None).await {
            Err(ClientError::Status { status, body }) => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(body, "not found");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unparseable_success_body_is_invalid_json() {
        let port = spawn_responder(
            "HTTP/1.1 200 OK\r\ncontent-length: 14\r\nconnection: close\r\n\r\n<html>oops</h>",
        )
        .await;
        let client = running_client(port);

        let result = client.request(Method::GET, "/api/notes", None).await;
        assert!(matches!(result, Err(ClientError::InvalidJson(_))));
    }
}

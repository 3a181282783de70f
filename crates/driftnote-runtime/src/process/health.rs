//! Health probes for supervised services.
//!
//! The backend exposes an authenticated HTTP health endpoint; the bridge
//! has no network surface, so its only health signal is process liveness.

use std::time::Duration;
use sysinfo::{Pid, ProcessStatus, System};
use tracing::debug;

/// Health endpoint path on the backend service.
pub const HEALTH_PATH: &str = "/health";

/// Header carrying the per-run request token.
pub const TOKEN_HEADER: &str = "X-Backend-Token";

/// Authenticated HTTP health probe against the local backend.
#[derive(Debug, Clone)]
pub struct HealthChecker {
    client: reqwest::Client,
}

impl HealthChecker {
    /// Create a checker with a shared connection pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Probe `GET /health` on the given local port.
    ///
    /// Returns `true` only for HTTP 200 within the timeout; any connection
    /// error, timeout or non-200 status is `false`. Never errors.
    pub async fn check(&self, port: u16, token: &str, timeout: Duration) -> bool {
        let url = format!("http://127.0.0.1:{port}{HEALTH_PATH}");
        match self
            .client
            .get(&url)
            .header(TOKEN_HEADER, token)
            .timeout(timeout)
            .send()
            .await
        {
            Ok(response) => {
                let healthy = response.status() == reqwest::StatusCode::OK;
                if !healthy {
                    debug!(%port, status = %response.status(), "health probe returned non-200");
                }
                healthy
            }
            Err(e) => {
                debug!(%port, error = %e, "health probe failed");
                false
            }
        }
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}

/// Check whether a process is alive using the system process table.
pub fn is_process_alive(pid: u32) -> bool {
    let mut system = System::new();
    system.refresh_processes(sysinfo::ProcessesToUpdate::Some(&[Pid::from_u32(pid)]), false);

    system.process(Pid::from_u32(pid)).is_some_and(|process| {
        matches!(
            process.status(),
            ProcessStatus::Run | ProcessStatus::Sleep | ProcessStatus::Idle
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn spawn_responder(response: &'static str) -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        port
    }

    #[tokio::test]
    async fn unreachable_port_is_unhealthy() {
        let checker = HealthChecker::new();
        // Allocate-and-release guarantees nothing is listening right now
        let port = crate::process::ports::allocate_ephemeral_port().unwrap();
        assert!(!checker.check(port, "token", Duration::from_millis(250)).await);
    }

    #[tokio::test]
    async fn answering_endpoint_is_healthy() {
        let port = spawn_responder(
            "HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok",
        )
        .await;
        let checker = HealthChecker::new();
        assert!(checker.check(port, "token", Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn non_200_status_is_unhealthy() {
        let port = spawn_responder(
            "HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await;
        let checker = HealthChecker::new();
        assert!(!checker.check(port, "token", Duration::from_secs(1)).await);
    }

    #[test]
    fn own_process_is_alive() {
        assert!(is_process_alive(std::process::id()));
    }

    #[test]
    fn bogus_pid_is_dead() {
        assert!(!is_process_alive(u32::MAX - 1));
    }
}

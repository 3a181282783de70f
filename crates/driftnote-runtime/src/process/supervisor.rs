//! Lifecycle supervision for one auxiliary service.
//!
//! One `ServiceSupervisor` exists per service for the lifetime of the
//! application. All mutations of the service state happen here, under a
//! single lock, and every committed mutation is broadcast as a full
//! snapshot. `start()` and `stop()` are coalescing: concurrent callers of
//! the same operation share one execution, and opposite operations wait
//! each other out instead of interleaving.

use driftnote_core::{
    AppEvent, EventEmitter, ServiceLogSink, ServiceState, ServiceStatus, now_ms,
};
use driftnote_core::{LogLevel, ServiceKind};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::config::{Readiness, ServiceConfig};
use super::health::{HealthChecker, is_process_alive};
use super::launch::{build_command, resolve_launch_plan};
use super::ports::allocate_ephemeral_port;
use super::shutdown::{exit_signal_name, shutdown_child};
use super::stream::spawn_stream_reader;
use crate::discovery::RuntimeDiscovery;

/// Poll interval for the child exit watcher.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Timeout applied to a single on-demand health probe.
const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

type SharedOp = Shared<BoxFuture<'static, ServiceState>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpKind {
    Start,
    Stop,
}

/// Supervisor owning the child process and state of one service.
pub struct ServiceSupervisor {
    config: ServiceConfig,
    discovery: Arc<RuntimeDiscovery>,
    emitter: Arc<dyn EventEmitter>,
    sink: Arc<dyn ServiceLogSink>,
    health: HealthChecker,
    state: Mutex<ServiceState>,
    child: tokio::sync::Mutex<Option<tokio::process::Child>>,
    pending: tokio::sync::Mutex<Option<(OpKind, SharedOp)>>,
}

impl ServiceSupervisor {
    pub fn new(
        config: ServiceConfig,
        discovery: Arc<RuntimeDiscovery>,
        emitter: Arc<dyn EventEmitter>,
        sink: Arc<dyn ServiceLogSink>,
    ) -> Self {
        Self {
            config,
            discovery,
            emitter,
            sink,
            health: HealthChecker::new(),
            state: Mutex::new(ServiceState::stopped()),
            child: tokio::sync::Mutex::new(None),
            pending: tokio::sync::Mutex::new(None),
        }
    }

    /// Which service this supervisor runs.
    #[must_use]
    pub const fn kind(&self) -> ServiceKind {
        self.config.kind
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> ServiceState {
        self.state.lock().expect("service state poisoned").clone()
    }

    /// Start the service, resolving once it is running (or failed).
    ///
    /// Already Running/Starting is a no-op returning the current snapshot;
    /// callers arriving during an in-flight start share its outcome; an
    /// in-flight stop is waited out first, then the start proceeds.
    pub async fn start(self: &Arc<Self>) -> ServiceState {
        loop {
            let fut = {
                let mut pending = self.pending.lock().await;
                match pending.as_ref() {
                    Some((OpKind::Start, fut)) => {
                        debug!(service = %self.kind(), "joining in-flight start");
                        Op::Join(fut.clone())
                    }
                    Some((OpKind::Stop, fut)) => {
                        debug!(service = %self.kind(), "waiting out in-flight stop before start");
                        Op::Retry(fut.clone())
                    }
                    None => {
                        let snapshot = self.state();
                        if matches!(
                            snapshot.status,
                            ServiceStatus::Running | ServiceStatus::Starting
                        ) {
                            return snapshot;
                        }
                        let this = Arc::clone(self);
                        let fut: SharedOp =
                            async move { this.run_start().await }.boxed().shared();
                        *pending = Some((OpKind::Start, fut.clone()));
                        Op::Own(fut)
                    }
                }
            };

            match fut {
                Op::Join(fut) => return fut.await,
                Op::Retry(fut) => {
                    let _ = fut.await;
                }
                Op::Own(fut) => {
                    let state = fut.await;
                    *self.pending.lock().await = None;
                    return state;
                }
            }
        }
    }

    /// Stop the service, resolving once the child is gone.
    ///
    /// Idempotent from Stopped/Error; callers arriving during an in-flight
    /// stop share its outcome; an in-flight start is waited out first.
    pub async fn stop(self: &Arc<Self>) -> ServiceState {
        loop {
            let fut = {
                let mut pending = self.pending.lock().await;
                match pending.as_ref() {
                    Some((OpKind::Stop, fut)) => {
                        debug!(service = %self.kind(), "joining in-flight stop");
                        Op::Join(fut.clone())
                    }
                    Some((OpKind::Start, fut)) => {
                        debug!(service = %self.kind(), "waiting out in-flight start before stop");
                        Op::Retry(fut.clone())
                    }
                    None => {
                        let this = Arc::clone(self);
                        let fut: SharedOp = async move { this.run_stop().await }.boxed().shared();
                        *pending = Some((OpKind::Stop, fut.clone()));
                        Op::Own(fut)
                    }
                }
            };

            match fut {
                Op::Join(fut) => return fut.await,
                Op::Retry(fut) => {
                    let _ = fut.await;
                }
                Op::Own(fut) => {
                    let state = fut.await;
                    *self.pending.lock().await = None;
                    return state;
                }
            }
        }
    }

    /// On-demand health probe.
    ///
    /// Backend: authenticated HTTP probe against the recorded port.
    /// Bridge: process-table liveness of the recorded pid.
    pub async fn check_health(&self) -> bool {
        let snapshot = self.state();
        if snapshot.status != ServiceStatus::Running {
            return false;
        }
        match self.config.kind {
            ServiceKind::Backend => match (snapshot.port, snapshot.token.as_deref()) {
                (Some(port), Some(token)) => {
                    self.health.check(port, token, HEALTH_PROBE_TIMEOUT).await
                }
                _ => false,
            },
            ServiceKind::Bridge => snapshot.pid.is_some_and(is_process_alive),
        }
    }

    /// Apply a mutation under the state lock and broadcast the result.
    fn mutate(&self, apply: impl FnOnce(&mut ServiceState)) -> ServiceState {
        let snapshot = {
            let mut state = self.state.lock().expect("service state poisoned");
            apply(&mut state);
            state.clone()
        };
        self.emitter
            .emit(AppEvent::service_state(self.config.kind, snapshot.clone()));
        snapshot
    }

    /// Fail the current start: Error status, resources cleared.
    fn fail(&self, message: impl Into<String>) -> ServiceState {
        let message = message.into();
        error!(service = %self.kind(), error = %message, "service start failed");
        self.mutate(|state| {
            state.status = ServiceStatus::Error;
            state.last_error = Some(message.clone());
            state.clear_resources();
        })
    }

    async fn run_start(self: Arc<Self>) -> ServiceState {
        let kind = self.config.kind;
        info!(service = %kind, "starting service");

        // Backend resources are issued fresh on every start; a restart never
        // reuses the previous port or token.
        let (port, token) = if kind == ServiceKind::Backend {
            match allocate_ephemeral_port() {
                Ok(port) => (Some(port), Some(Uuid::new_v4().simple().to_string())),
                Err(e) => return self.fail(format!("port allocation failed: {e}")),
            }
        } else {
            (None, None)
        };

        self.mutate(|state| {
            state.status = ServiceStatus::Starting;
            state.port = port;
            state.token.clone_from(&token);
            state.started_at = Some(now_ms());
            state.last_error = None;
            state.last_exit_code = None;
            state.last_signal = None;
        });

        let runtime = self.discovery.ensure().await;

        let plan = match resolve_launch_plan(&self.config, &runtime) {
            Ok(plan) => plan,
            Err(e) => return self.fail(format!("launch resolution failed: {e}")),
        };

        let mut command = match build_command(&plan, kind, &runtime, port, token.as_deref()) {
            Ok(command) => command,
            Err(e) => return self.fail(format!("launch preparation failed: {e}")),
        };

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => return self.fail(format!("spawn failed: {e}")),
        };

        if let Some(stdout) = child.stdout.take() {
            spawn_stream_reader(stdout, kind, LogLevel::Info, Arc::clone(&self.sink));
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_stream_reader(stderr, kind, LogLevel::Warn, Arc::clone(&self.sink));
        }

        let pid = child.id();
        self.mutate(|state| state.pid = pid);
        info!(service = %kind, pid, "service process spawned");

        *self.child.lock().await = Some(child);
        self.spawn_exit_watcher();

        match self.config.readiness {
            Readiness::HttpHealth {
                poll_interval,
                timeout,
            } => self.await_http_ready(port, token.as_deref(), poll_interval, timeout).await,
            Readiness::GraceDelay { delay } => self.await_grace_ready(delay).await,
        }
    }

    /// Background task that reaps the child and records its exit.
    ///
    /// The watcher owns the Stopped transition for unsolicited exits
    /// (crash, external kill). It backs off silently when `stop()` has
    /// already taken the child out of the slot.
    fn spawn_exit_watcher(self: &Arc<Self>) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                sleep(EXIT_POLL_INTERVAL).await;
                let mut slot = this.child.lock().await;
                let Some(child) = slot.as_mut() else {
                    return; // stop() took ownership
                };
                match child.try_wait() {
                    Ok(None) => {}
                    Ok(Some(status)) => {
                        *slot = None;
                        drop(slot);
                        let code = status.code();
                        let signal = exit_signal_name(&status);
                        warn!(
                            service = %this.kind(),
                            code,
                            signal = signal.as_deref(),
                            "service process exited"
                        );
                        this.mutate(|state| {
                            state.status = ServiceStatus::Stopped;
                            state.last_exit_code = code;
                            state.last_signal.clone_from(&signal);
                            state.clear_resources();
                        });
                        return;
                    }
                    Err(e) => {
                        warn!(service = %this.kind(), error = %e, "exit watcher failed to poll child");
                        return;
                    }
                }
            }
        });
    }

    async fn await_http_ready(
        &self,
        port: Option<u16>,
        token: Option<&str>,
        poll_interval: Duration,
        timeout: Duration,
    ) -> ServiceState {
        let (Some(port), Some(token)) = (port, token) else {
            return self.fail("backend started without port/token");
        };

        let deadline = Instant::now() + timeout;
        loop {
            if self.child.lock().await.is_none() {
                // Child exited before ever answering the health probe
                return self.fail("service exited during startup");
            }
            if self.health.check(port, token, poll_interval).await {
                break;
            }
            if Instant::now() >= deadline {
                warn!(service = %self.kind(), %port, "healthcheck timed out, killing child");
                if let Some(child) = self.child.lock().await.take() {
                    if let Err(e) = shutdown_child(child, Duration::from_secs(1)).await {
                        warn!(service = %self.kind(), error = %e, "failed to kill unresponsive child");
                    }
                }
                return self.fail("healthcheck-timeout");
            }
            sleep(poll_interval).await;
        }

        info!(service = %self.kind(), %port, "service is healthy");
        self.mutate(|state| state.status = ServiceStatus::Running)
    }

    async fn await_grace_ready(&self, delay: Duration) -> ServiceState {
        sleep(delay).await;

        let alive = {
            let slot = self.child.lock().await;
            match slot.as_ref() {
                Some(child) => child.id().is_some_and(is_process_alive),
                None => false,
            }
        };
        if !alive {
            return self.fail("service exited during startup");
        }

        info!(service = %self.kind(), "service survived startup grace period");
        self.mutate(|state| state.status = ServiceStatus::Running)
    }

    async fn run_stop(self: Arc<Self>) -> ServiceState {
        let kind = self.config.kind;

        let Some(child) = self.child.lock().await.take() else {
            // Nothing to tear down; normalize Error into a clean Stopped.
            let snapshot = self.state();
            if snapshot.status == ServiceStatus::Stopped
                && snapshot.pid.is_none()
                && snapshot.port.is_none()
            {
                return snapshot;
            }
            return self.mutate(|state| {
                state.status = ServiceStatus::Stopped;
                state.clear_resources();
            });
        };

        info!(service = %kind, "stopping service");
        self.mutate(|state| state.status = ServiceStatus::Stopping);

        match shutdown_child(child, self.config.stop_grace).await {
            Ok(status) => {
                let code = status.code();
                let signal = exit_signal_name(&status);
                debug!(service = %kind, code, signal = signal.as_deref(), "service shut down");
                self.mutate(|state| {
                    state.status = ServiceStatus::Stopped;
                    state.last_exit_code = code;
                    state.last_signal = signal.clone();
                    state.clear_resources();
                })
            }
            Err(e) => {
                // The child is dead or unreachable either way; report
                // Stopped and carry the teardown error for diagnostics.
                warn!(service = %kind, error = %e, "shutdown reported an error");
                self.mutate(|state| {
                    state.status = ServiceStatus::Stopped;
                    state.last_error = Some(format!("shutdown error: {e}"));
                    state.clear_resources();
                })
            }
        }
    }
}

enum Op {
    Own(SharedOp),
    Join(SharedOp),
    Retry(SharedOp),
}

#[cfg(test)]
impl ServiceSupervisor {
    /// Replace the state snapshot directly (test setup only).
    pub(crate) fn set_state(&self, state: ServiceState) {
        *self.state.lock().expect("service state poisoned") = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftnote_core::NoopEmitter;
    use std::path::PathBuf;

    use super::super::config::LaunchOverride;

    fn supervisor(config: ServiceConfig) -> Arc<ServiceSupervisor> {
        let emitter = Arc::new(NoopEmitter::new());
        let discovery = Arc::new(RuntimeDiscovery::new(emitter.clone()));
        Arc::new(ServiceSupervisor::new(
            config,
            discovery,
            emitter.clone(),
            emitter,
        ))
    }

    #[tokio::test]
    async fn initial_state_is_stopped() {
        let sup = supervisor(ServiceConfig::bridge());
        assert_eq!(sup.state().status, ServiceStatus::Stopped);
        assert!(!sup.check_health().await);
    }

    #[tokio::test]
    async fn stop_from_stopped_is_a_clean_noop() {
        let sup = supervisor(ServiceConfig::backend());
        let before = sup.state();
        let after = sup.stop().await;
        assert_eq!(before, after);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn bridge_start_stop_lifecycle() {
        let config = ServiceConfig::bridge().with_launch_override(LaunchOverride {
            program: PathBuf::from("sleep"),
            args: vec!["30".to_string()],
            cwd: None,
        });
        let sup = supervisor(config);

        let started = sup.start().await;
        assert_eq!(started.status, ServiceStatus::Running);
        assert!(started.pid.is_some());
        assert!(started.port.is_none(), "bridge must not get a port");

        let stopped = sup.stop().await;
        assert_eq!(stopped.status, ServiceStatus::Stopped);
        assert!(stopped.pid.is_none());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn start_is_idempotent_while_running() {
        let config = ServiceConfig::bridge().with_launch_override(LaunchOverride {
            program: PathBuf::from("sleep"),
            args: vec!["30".to_string()],
            cwd: None,
        });
        let sup = supervisor(config);

        let first = sup.start().await;
        let second = sup.start().await;
        assert_eq!(first.pid, second.pid);

        sup.stop().await;
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn immediate_exit_during_startup_is_an_error() {
        let config = ServiceConfig::bridge().with_launch_override(LaunchOverride {
            program: PathBuf::from("true"),
            args: Vec::new(),
            cwd: None,
        });
        let sup = supervisor(config);

        let state = sup.start().await;
        assert_eq!(state.status, ServiceStatus::Error);
        assert_eq!(state.last_error.as_deref(), Some("service exited during startup"));
        assert!(state.pid.is_none());
    }

    #[tokio::test]
    async fn spawn_failure_is_an_error() {
        let config = ServiceConfig::bridge().with_launch_override(LaunchOverride {
            program: PathBuf::from("/nonexistent/driftnote-no-such-binary"),
            args: Vec::new(),
            cwd: None,
        });
        let sup = supervisor(config);

        let state = sup.start().await;
        assert_eq!(state.status, ServiceStatus::Error);
        assert!(state.last_error.unwrap().contains("spawn failed"));
    }
}

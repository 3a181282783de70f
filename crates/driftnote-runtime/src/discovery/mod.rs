//! Runtime discovery: locating the executables the services need.
//!
//! Discovery is idempotent and safe to trigger from anywhere (app startup,
//! a settings screen refresh button, a supervisor about to spawn). Callers
//! arriving during an in-flight pass share its result instead of racing a
//! second set of version probes.

mod candidates;
mod path_env;
mod probe;

pub use path_env::enriched_path_var;
pub use probe::{CommandProber, PROBE_TIMEOUT, VersionProber};

use driftnote_core::{
    AppEvent, EventEmitter, ExecutableId, ExecutableLocation, RuntimeStatus, now_ms,
};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, info};

type SharedDiscovery = Shared<BoxFuture<'static, RuntimeStatus>>;

/// Platform-aware executable discovery with request coalescing.
///
/// Owned by the composition root and shared by reference; the last completed
/// pass is cached for synchronous reads.
pub struct RuntimeDiscovery {
    prober: Arc<dyn VersionProber>,
    emitter: Arc<dyn EventEmitter>,
    cached: RwLock<Option<RuntimeStatus>>,
    inflight: Mutex<Option<SharedDiscovery>>,
}

impl RuntimeDiscovery {
    /// Create a discovery instance using real version probes.
    pub fn new(emitter: Arc<dyn EventEmitter>) -> Self {
        Self::with_prober(Arc::new(CommandProber::new()), emitter)
    }

    /// Create a discovery instance with an injected prober (tests).
    pub fn with_prober(prober: Arc<dyn VersionProber>, emitter: Arc<dyn EventEmitter>) -> Self {
        Self {
            prober,
            emitter,
            cached: RwLock::new(None),
            inflight: Mutex::new(None),
        }
    }

    /// Result of the most recent completed pass, if any.
    pub fn current(&self) -> Option<RuntimeStatus> {
        self.cached.read().expect("discovery cache poisoned").clone()
    }

    /// Run (or join) a discovery pass and return its result.
    ///
    /// Concurrent callers during an in-flight pass receive the identical
    /// `RuntimeStatus`; only one set of version probes executes.
    pub async fn discover(self: &Arc<Self>) -> RuntimeStatus {
        let (fut, created) = {
            let mut inflight = self.inflight.lock().await;
            if let Some(existing) = inflight.as_ref() {
                debug!("joining in-flight runtime discovery");
                (existing.clone(), false)
            } else {
                let this = Arc::clone(self);
                let fut: SharedDiscovery = async move { this.run_pass().await }.boxed().shared();
                *inflight = Some(fut.clone());
                (fut, true)
            }
        };

        let status = fut.await;

        if created {
            // Release the slot unconditionally so later calls start fresh
            *self.inflight.lock().await = None;
        }

        status
    }

    /// Ensure a status is available, preferring the cache.
    ///
    /// Used by supervisors that need an execution environment but should not
    /// force duplicate probing on every start.
    pub async fn ensure(self: &Arc<Self>) -> RuntimeStatus {
        if let Some(status) = self.current() {
            return status;
        }
        self.discover().await
    }

    async fn run_pass(self: Arc<Self>) -> RuntimeStatus {
        debug!("runtime discovery pass starting");

        let python = self.locate(ExecutableId::Python).await;
        let uv = self.locate(ExecutableId::Uv).await;
        let scribe = self.locate(ExecutableId::Scribe).await;

        let status = RuntimeStatus {
            python,
            uv,
            scribe,
            last_checked_at: now_ms(),
        };

        info!(
            python = status.python.found,
            uv = status.uv.found,
            scribe = status.scribe.found,
            "runtime discovery pass finished"
        );

        *self.cached.write().expect("discovery cache poisoned") = Some(status.clone());
        self.emitter.emit(AppEvent::runtime_status(status.clone()));

        status
    }

    async fn locate(&self, id: ExecutableId) -> ExecutableLocation {
        let Some(path) = candidates::find_executable(id) else {
            debug!(executable = %id, "not found in any candidate directory");
            return ExecutableLocation::not_found();
        };

        match self.prober.probe(&path).await {
            Ok(version) => {
                debug!(executable = %id, path = %path.display(), %version, "found");
                ExecutableLocation::found(path, Some(version))
            }
            Err(e) => {
                // Present on disk but the probe failed; keep the path and
                // surface the probe error verbatim.
                debug!(executable = %id, path = %path.display(), error = %e, "version probe failed");
                ExecutableLocation {
                    found: true,
                    path: Some(path),
                    version: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use driftnote_core::NoopEmitter;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Prober double that counts invocations and never touches the OS.
    struct CountingProber {
        calls: AtomicUsize,
    }

    impl CountingProber {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VersionProber for CountingProber {
        async fn probe(&self, _path: &Path) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Slow enough that concurrent discover() calls overlap
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            Ok("0.0-test".to_string())
        }
    }

    #[tokio::test]
    async fn concurrent_discovery_shares_one_pass() {
        let prober = Arc::new(CountingProber::new());
        let discovery = Arc::new(RuntimeDiscovery::with_prober(
            prober.clone(),
            Arc::new(NoopEmitter::new()),
        ));

        let (a, b) = tokio::join!(discovery.discover(), discovery.discover());
        assert_eq!(a, b);

        // One pass probes each *found* executable at most once; a second
        // concurrent caller must not double that.
        let after_joined = prober.calls();
        let _ = discovery.discover().await;
        let after_second_pass = prober.calls();
        assert_eq!(after_second_pass - after_joined, after_joined);
    }

    #[tokio::test]
    async fn discovery_caches_last_result() {
        let discovery = Arc::new(RuntimeDiscovery::with_prober(
            Arc::new(CountingProber::new()),
            Arc::new(NoopEmitter::new()),
        ));
        assert!(discovery.current().is_none());
        let status = discovery.discover().await;
        assert_eq!(discovery.current(), Some(status.clone()));

        // ensure() serves the cache without a new pass
        let ensured = discovery.ensure().await;
        assert_eq!(ensured, status);
    }

    #[tokio::test]
    async fn misses_are_soft() {
        // With probes stubbed, any executable genuinely absent from the
        // machine must come back as a not-found value, never an error.
        let discovery = Arc::new(RuntimeDiscovery::with_prober(
            Arc::new(CountingProber::new()),
            Arc::new(NoopEmitter::new()),
        ));
        let status = discovery.discover().await;
        for id in ExecutableId::ALL {
            let loc = status.location(id);
            if !loc.found {
                assert_eq!(loc.error.as_deref(), Some("not-found"));
                assert!(loc.path.is_none());
                assert!(loc.version.is_none());
            }
        }
    }
}

//! Bounded-timeout version probes for discovered executables.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Default deadline for a single `--version` probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Port for running version probes against candidate executables.
///
/// Behind a trait so tests can count invocations and return canned output
/// without spawning processes.
#[async_trait]
pub trait VersionProber: Send + Sync {
    /// Run `<path> --version` and return its trimmed combined output.
    async fn probe(&self, path: &Path) -> Result<String>;
}

/// Real prober that executes the candidate with a bounded timeout.
#[derive(Debug, Clone)]
pub struct CommandProber {
    timeout: Duration,
}

impl CommandProber {
    /// Create a prober with the default timeout.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: PROBE_TIMEOUT,
        }
    }

    /// Create a prober with a custom timeout.
    #[must_use]
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for CommandProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VersionProber for CommandProber {
    async fn probe(&self, path: &Path) -> Result<String> {
        debug!(path = %path.display(), "running version probe");

        let mut cmd = Command::new(path);
        cmd.arg("--version")
            .stdin(std::process::Stdio::null())
            // A hung probe must not outlive its deadline
            .kill_on_drop(true);

        let output = timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| anyhow!("version probe timed out after {:?}", self.timeout))?
            .with_context(|| format!("failed to run {} --version", path.display()))?;

        // Combined stdout+stderr: some tools print their version to stderr
        let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(combined.trim().to_string())
    }
}

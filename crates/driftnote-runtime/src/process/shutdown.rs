//! Graceful child shutdown with SIGTERM → SIGKILL escalation.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::time::timeout;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Gracefully shut down a child process, escalating to a forced kill.
///
/// # Strategy
/// 1. Send SIGTERM and wait up to `grace` for a clean exit
/// 2. If still running, send SIGKILL
/// 3. Wait for reaping (required to avoid zombies)
///
/// # Platform behavior
/// - Unix: SIGTERM via nix, then SIGKILL via `Child::kill`
/// - Windows: immediate `Child::kill` (no graceful equivalent)
pub async fn shutdown_child(mut child: Child, grace: Duration) -> io::Result<ExitStatus> {
    #[cfg(unix)]
    {
        shutdown_unix(&mut child, grace).await
    }

    #[cfg(not(unix))]
    {
        let _ = grace;
        shutdown_windows(&mut child).await
    }
}

#[cfg(unix)]
async fn shutdown_unix(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    let pid = child
        .id()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "child has no PID"))?;

    // Phase 1: SIGTERM with bounded grace period
    #[allow(clippy::cast_possible_wrap)]
    if let Err(e) = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        // Process may have already exited
        if e == nix::errno::Errno::ESRCH {
            return child.wait().await;
        }
        return Err(io::Error::other(e));
    }

    if let Ok(result) = timeout(grace, child.wait()).await {
        return result;
    }

    // Phase 2: SIGKILL (Child::kill sends SIGKILL on Unix)
    child.kill().await?;

    // Phase 3: wait for reaping (fast after SIGKILL)
    child.wait().await
}

#[cfg(not(unix))]
async fn shutdown_windows(child: &mut Child) -> io::Result<ExitStatus> {
    child.kill().await?;
    child.wait().await
}

/// Human-readable name of the signal that terminated a child, if any.
#[must_use]
pub fn exit_signal_name(status: &ExitStatus) -> Option<String> {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        status.signal().map(|sig| {
            Signal::try_from(sig).map_or_else(|_| format!("signal {sig}"), |s| s.as_str().to_string())
        })
    }

    #[cfg(not(unix))]
    {
        let _ = status;
        None
    }
}

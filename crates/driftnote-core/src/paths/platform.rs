//! Platform-specific path detection and resolution.
//!
//! This module contains private helpers for detecting the runtime
//! environment (local repo vs installed binary) and resolving
//! platform-appropriate paths. Public API is exposed through `paths`.

use std::env;
use std::fs;
use std::path::PathBuf;

use super::error::PathError;

/// Detect if we are running from the local repository.
///
/// Returns `Some(path)` if we are in a dev environment or running a release
/// build from within the source repo. Returns `None` if we are running a
/// standalone binary (installed or bundled as a desktop app).
#[allow(clippy::unnecessary_wraps)] // Option is needed for release builds
pub(super) fn detect_local_repo() -> Option<PathBuf> {
    let repo_root = PathBuf::from(env!("DRIFTNOTE_REPO_ROOT"));

    #[cfg(debug_assertions)]
    {
        // In debug mode, always assume we want to use the repo we are building from
        Some(repo_root)
    }

    #[cfg(not(debug_assertions))]
    {
        // In release mode, check if this binary was built from a local repo.

        // First, verify the repo path exists and looks like a valid checkout
        if !repo_root.exists()
            || (!repo_root.join(".git").exists() && !repo_root.join("Cargo.toml").exists())
        {
            return None;
        }

        // Strategy 1: Check for the marker file created by build.rs
        let marker_file = repo_root.join("data").join(".driftnote_repo_path");
        if marker_file.exists() {
            if let Ok(contents) = fs::read_to_string(&marker_file) {
                if contents.trim() == repo_root.to_string_lossy() {
                    return Some(repo_root);
                }
            }
        }

        // Strategy 2 (fallback): Check if executable is inside the repo
        if let Ok(exe_path) = env::current_exe() {
            if let Ok(canonical_exe) = exe_path.canonicalize() {
                if let Ok(canonical_repo) = repo_root.canonicalize() {
                    if canonical_exe.starts_with(&canonical_repo) {
                        return Some(repo_root);
                    }
                }
            }
        }

        None
    }
}

/// Check if we are running from a pre-built binary (not from the source repo).
pub fn is_prebuilt_binary() -> bool {
    detect_local_repo().is_none()
}

/// Get the root directory for application data (index, logs, vault metadata).
///
/// Resolution order:
/// 1. `DRIFTNOTE_DATA_DIR` environment variable (highest priority)
/// 2. Local repository (if running from source)
/// 3. System data directory (e.g., `~/.local/share/driftnote`)
pub fn data_root() -> Result<PathBuf, PathError> {
    // 1. Runtime override (highest priority)
    if let Ok(path) = env::var("DRIFTNOTE_DATA_DIR") {
        return Ok(PathBuf::from(path));
    }

    // 2. Try local repo
    if let Some(repo) = detect_local_repo() {
        return Ok(repo.join("data"));
    }

    // 3. Default to system data directory
    let data_dir = dirs::data_local_dir().ok_or(PathError::NoDataDir)?;
    let root = data_dir.join("driftnote");

    if !root.exists() {
        fs::create_dir_all(&root).map_err(|e| PathError::CreateFailed {
            path: root.clone(),
            reason: e.to_string(),
        })?;
    }

    Ok(root)
}

/// Get the root directory for application resources (bundled service binaries).
///
/// Resolution order:
/// 1. `DRIFTNOTE_RESOURCE_DIR` environment variable
/// 2. Local repository (if running from source)
/// 3. Falls back to data root
pub fn resource_root() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var("DRIFTNOTE_RESOURCE_DIR") {
        return Ok(PathBuf::from(path));
    }

    if let Some(repo) = detect_local_repo() {
        return Ok(repo);
    }

    data_root()
}

/// Directory where supervised services write their own log files.
pub fn log_dir() -> Result<PathBuf, PathError> {
    Ok(data_root()?.join("logs"))
}

/// Development checkout of the service sources (`backend/` in the repo).
///
/// Only meaningful when running from a local repo; packaged builds launch
/// bundled binaries from the resource root instead.
pub fn dev_service_dir() -> Option<PathBuf> {
    detect_local_repo().map(|repo| repo.join("backend"))
}

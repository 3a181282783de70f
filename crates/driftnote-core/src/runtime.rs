//! Runtime discovery results: which external executables were found where.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// External executables the application depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutableId {
    /// The Python language runtime used by both auxiliary services.
    Python,
    /// The `uv` package-execution helper (runs the services in dev mode).
    Uv,
    /// The `scribe` assistant CLI.
    Scribe,
}

impl ExecutableId {
    /// All tracked executables, in discovery order.
    pub const ALL: [Self; 3] = [Self::Python, Self::Uv, Self::Scribe];

    /// Base executable name (platform variants are derived from this).
    #[must_use]
    pub const fn base_name(self) -> &'static str {
        match self {
            Self::Python => "python3",
            Self::Uv => "uv",
            Self::Scribe => "scribe",
        }
    }
}

impl std::fmt::Display for ExecutableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.base_name())
    }
}

/// Where (and whether) a tracked executable was found.
///
/// Immutable once produced; a re-discovery replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutableLocation {
    /// Whether the executable exists on this system.
    pub found: bool,
    /// Absolute path to the executable, when found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Trimmed combined output of the `--version` probe, when it ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Error description for a miss or a failed probe.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutableLocation {
    /// A successful discovery with an optional version string.
    #[must_use]
    pub const fn found(path: PathBuf, version: Option<String>) -> Self {
        Self {
            found: true,
            path: Some(path),
            version,
            error: None,
        }
    }

    /// The executable was absent from every candidate directory.
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            found: false,
            path: None,
            version: None,
            error: Some("not-found".to_string()),
        }
    }
}

/// Aggregate result of one discovery pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeStatus {
    /// Location of the Python runtime.
    pub python: ExecutableLocation,
    /// Location of the `uv` helper.
    pub uv: ExecutableLocation,
    /// Location of the `scribe` CLI.
    pub scribe: ExecutableLocation,
    /// Unix timestamp in milliseconds when this pass completed.
    pub last_checked_at: u64,
}

impl RuntimeStatus {
    /// Look up a location by executable id.
    #[must_use]
    pub const fn location(&self, id: ExecutableId) -> &ExecutableLocation {
        match id {
            ExecutableId::Python => &self.python,
            ExecutableId::Uv => &self.uv,
            ExecutableId::Scribe => &self.scribe,
        }
    }

    /// Directories containing each found executable, in discovery order.
    ///
    /// Misses are omitted. Duplicates are preserved here; callers that build
    /// a search path de-duplicate.
    #[must_use]
    pub fn found_dirs(&self) -> Vec<PathBuf> {
        ExecutableId::ALL
            .iter()
            .filter_map(|id| self.location(*id).path.as_deref())
            .filter_map(|p| p.parent().map(std::path::Path::to_path_buf))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_carries_soft_error() {
        let loc = ExecutableLocation::not_found();
        assert!(!loc.found);
        assert!(loc.path.is_none());
        assert!(loc.version.is_none());
        assert_eq!(loc.error.as_deref(), Some("not-found"));
    }

    #[test]
    fn found_dirs_skips_misses() {
        let status = RuntimeStatus {
            python: ExecutableLocation::found(PathBuf::from("/usr/bin/python3"), None),
            uv: ExecutableLocation::not_found(),
            scribe: ExecutableLocation::found(PathBuf::from("/usr/local/bin/scribe"), None),
            last_checked_at: 0,
        };
        assert_eq!(
            status.found_dirs(),
            vec![PathBuf::from("/usr/bin"), PathBuf::from("/usr/local/bin")]
        );
    }

    #[test]
    fn status_serializes_camel_case() {
        let status = RuntimeStatus {
            python: ExecutableLocation::not_found(),
            uv: ExecutableLocation::not_found(),
            scribe: ExecutableLocation::not_found(),
            last_checked_at: 1234,
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"lastCheckedAt\":1234"));
        assert!(json.contains("\"error\":\"not-found\""));
    }
}

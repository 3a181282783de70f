//! Candidate directory and executable-name resolution per platform.
//!
//! Discovery builds an ordered, de-duplicated list of directories likely to
//! hold each tracked executable: platform-standard install locations, the
//! current `PATH`, and version-manager-managed directories (newest version
//! first). GUI applications are often launched with an impoverished `PATH`,
//! which is why the standard locations come first rather than trusting the
//! inherited environment.

use driftnote_core::ExecutableId;
use std::env;
use std::path::{Path, PathBuf};

/// Base executable names to try for an id, in priority order.
fn base_names(id: ExecutableId) -> &'static [&'static str] {
    match id {
        ExecutableId::Python => &["python3", "python"],
        ExecutableId::Uv => &["uv"],
        ExecutableId::Scribe => &["scribe"],
    }
}

/// Platform-specific file name variants for one base name, in priority order.
fn name_variants(base: &str) -> Vec<String> {
    if cfg!(windows) {
        vec![
            format!("{base}.exe"),
            format!("{base}.cmd"),
            format!("{base}.bat"),
            base.to_string(),
        ]
    } else {
        vec![base.to_string()]
    }
}

/// Fixed user-local install locations for the `scribe` CLI.
///
/// The CLI installer places the binary outside any standard prefix, so these
/// are checked as full file paths before the generic directory search runs.
fn scribe_install_paths() -> Vec<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };
    let binary = if cfg!(windows) { "scribe.exe" } else { "scribe" };
    vec![
        home.join(".scribe").join("local").join(binary),
        home.join(".local").join("bin").join(binary),
    ]
}

/// Platform-standard install directories, highest priority first.
fn platform_install_dirs() -> Vec<PathBuf> {
    let mut dirs_list: Vec<PathBuf> = Vec::new();

    #[cfg(windows)]
    {
        if let Ok(local) = env::var("LOCALAPPDATA") {
            let local = PathBuf::from(local);
            dirs_list.push(local.join("Programs").join("Python"));
            dirs_list.push(local.join("Microsoft").join("WindowsApps"));
        }
        if let Some(home) = dirs::home_dir() {
            dirs_list.push(home.join(".local").join("bin"));
            dirs_list.push(home.join(".cargo").join("bin"));
        }
    }

    #[cfg(not(windows))]
    {
        dirs_list.push(PathBuf::from("/opt/homebrew/bin"));
        dirs_list.push(PathBuf::from("/usr/local/bin"));
        dirs_list.push(PathBuf::from("/usr/bin"));
        dirs_list.push(PathBuf::from("/bin"));
        if let Some(home) = dirs::home_dir() {
            dirs_list.push(home.join(".local").join("bin"));
            dirs_list.push(home.join(".cargo").join("bin"));
        }
    }

    dirs_list
}

/// Parse a version from a directory name into a numeric tuple.
///
/// Extracts only the leading numeric portion of each dot-separated
/// component, so `cpython-3.13.1-linux` parses via its `3.13.1` core and
/// `3.12-dev` parses as (3, 12, 0). Names without a leading
/// `major.minor` yield `None`.
fn parse_version_key(name: &str) -> Option<(u32, u32, u32)> {
    let numeric_core = name
        .split(|c: char| !c.is_ascii_digit() && c != '.')
        .find(|s| s.contains('.') && s.starts_with(|c: char| c.is_ascii_digit()))?;
    let parse_numeric = |part: &str| -> Option<u32> {
        let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
        digits.parse::<u32>().ok()
    };
    let mut parts = numeric_core.split('.');
    let major = parse_numeric(parts.next()?)?;
    let minor = parse_numeric(parts.next()?)?;
    let patch = parts.next().and_then(parse_numeric).unwrap_or(0);
    Some((major, minor, patch))
}

/// Version-stamped subdirectories of `root`, newest version first.
///
/// Names that do not parse as versions sort after every parsed one.
fn sorted_version_dirs(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };
    let mut versions: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    versions.sort_by_key(|p| {
        std::cmp::Reverse(
            p.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .as_deref()
                .and_then(parse_version_key),
        )
    });
    versions
}

/// Directories managed by Python version managers, newest version first.
///
/// Covers uv-managed interpreters and pyenv.
fn python_version_manager_dirs() -> Vec<PathBuf> {
    let mut found = Vec::new();
    let Some(home) = dirs::home_dir() else {
        return found;
    };

    let roots = [
        home.join(".local").join("share").join("uv").join("python"),
        home.join(".pyenv").join("versions"),
    ];

    for root in roots {
        for version_dir in sorted_version_dirs(&root) {
            if cfg!(windows) {
                found.push(version_dir);
            } else {
                found.push(version_dir.join("bin"));
            }
        }
    }

    found
}

/// Ordered, de-duplicated candidate directories for one executable.
pub fn candidate_dirs(id: ExecutableId) -> Vec<PathBuf> {
    let mut ordered: Vec<PathBuf> = Vec::new();
    let mut push = |dir: PathBuf| {
        if !ordered.contains(&dir) {
            ordered.push(dir);
        }
    };

    for dir in platform_install_dirs() {
        push(dir);
    }
    if let Some(path_var) = env::var_os("PATH") {
        for dir in env::split_paths(&path_var) {
            push(dir);
        }
    }
    if id == ExecutableId::Python {
        for dir in python_version_manager_dirs() {
            push(dir);
        }
    }

    ordered
}

/// Try every name variant of `id` inside `dir`; first hit wins.
fn find_in_dir(dir: &Path, id: ExecutableId) -> Option<PathBuf> {
    for base in base_names(id) {
        for variant in name_variants(base) {
            let candidate = dir.join(variant);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Locate one tracked executable on disk, or `None` when absent everywhere.
pub fn find_executable(id: ExecutableId) -> Option<PathBuf> {
    // Scribe's installer uses fixed locations; check those first
    if id == ExecutableId::Scribe {
        for path in scribe_install_paths() {
            if path.is_file() {
                return Some(path);
            }
        }
    }

    candidate_dirs(id)
        .iter()
        .find_map(|dir| find_in_dir(dir, id))
}

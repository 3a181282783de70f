//! Search-path enrichment for spawned child processes.
//!
//! Desktop applications launched outside a shell inherit a minimal `PATH`;
//! children spawned from them then fail to find peer tools. The enriched
//! variable prepends the directories where discovery actually found the
//! tracked executables.

use driftnote_core::RuntimeStatus;
use std::env;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

/// Build a search-path value from `base` with every discovered executable's
/// directory prepended.
///
/// New entries come first, in discovery order, followed by the original
/// entries; the whole list is de-duplicated while preserving relative order.
/// Executables that were not found contribute nothing.
#[must_use]
pub fn enriched_path_var(base: Option<&OsStr>, status: &RuntimeStatus) -> OsString {
    let mut ordered: Vec<PathBuf> = Vec::new();
    let mut push = |dir: PathBuf| {
        if !ordered.contains(&dir) {
            ordered.push(dir);
        }
    };

    for dir in status.found_dirs() {
        push(dir);
    }
    if let Some(base) = base {
        for dir in env::split_paths(base) {
            push(dir);
        }
    }

    // join_paths only fails when an entry embeds the separator; fall back to
    // the untouched base rather than handing the child a broken PATH.
    env::join_paths(ordered)
        .unwrap_or_else(|_| base.map(OsStr::to_os_string).unwrap_or_default())
}

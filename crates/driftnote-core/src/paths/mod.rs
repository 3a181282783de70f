//! Path resolution for driftnote data and resource directories.
//!
//! Provides the canonical answers for "where does the app keep its data"
//! and "are we running from a source checkout or a packaged binary".
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - No interactive/terminal I/O — adapters handle user prompts separately
//! - OS-specific logic is kept private in `platform`

mod error;
mod platform;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::PathError;
pub use platform::{data_root, dev_service_dir, is_prebuilt_binary, log_dir, resource_root};

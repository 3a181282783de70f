//! CLI library: parser, commands and handlers.
//!
//! Kept as a library so the parser can be unit-tested; `main.rs` is only
//! the composition root and dispatch.

pub mod commands;
pub mod handlers;
pub mod parser;

pub use commands::Commands;
pub use parser::Cli;

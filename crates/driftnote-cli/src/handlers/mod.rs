//! Command handlers, one module per subcommand.

pub mod paths;
pub mod request;
pub mod run;
pub mod runtime;

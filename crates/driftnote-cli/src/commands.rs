//! Subcommand definitions.

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Discover the runtime executables (python, uv, scribe) on this machine
    Runtime,

    /// Show the resolved data, log and resource directories
    Paths,

    /// Start both services and stream their logs until interrupted
    Run,

    /// Boot the backend, send it one request, print the JSON response
    Request {
        /// HTTP method (get, post, put, delete, ...)
        method: String,

        /// Request path, starting with `/`
        path: String,

        /// JSON request body
        #[arg(long)]
        body: Option<String>,
    },
}

//! CLI entry point - the composition root.
//!
//! The one place where the service manager is constructed; handlers
//! receive it by reference and never build their own.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use driftnote_cli::{Cli, Commands, handlers};
use driftnote_runtime::ServiceManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    let manager = ServiceManager::new();

    match command {
        Commands::Runtime => handlers::runtime::execute(&manager).await?,
        Commands::Paths => handlers::paths::execute()?,
        Commands::Run => handlers::run::execute(&manager).await?,
        Commands::Request { method, path, body } => {
            handlers::request::execute(&manager, &method, &path, body.as_deref()).await?;
        }
    }

    Ok(())
}

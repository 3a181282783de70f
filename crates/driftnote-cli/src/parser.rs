//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for the driftnote service runtime.
#[derive(Parser)]
#[command(name = "driftnote")]
#[command(about = "Supervise driftnote's local backend and bridge services")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn request_command_parses_body_flag() {
        let cli = Cli::parse_from([
            "driftnote",
            "request",
            "post",
            "/api/notes",
            "--body",
            "{\"title\":\"x\"}",
        ]);
        match cli.command {
            Some(Commands::Request { method, path, body }) => {
                assert_eq!(method, "post");
                assert_eq!(path, "/api/notes");
                assert!(body.is_some());
            }
            _ => panic!("expected request command"),
        }
    }
}

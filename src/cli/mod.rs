//! CLI module for LiSearch.

pub mod commands;
mod output;
pub mod preflight;

pub use output::{content_preview, Output};

use clap::{Parser, Subcommand};

/// LiSearch - Liquor Store AI Assistant
///
/// Ask natural language questions about store sales and inventory.
#[derive(Parser, Debug)]
#[command(name = "lisearch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Show iterations and tool calls after each answer
        #[arg(short, long)]
        debug: bool,
    },

    /// Ask a single question
    Ask {
        /// The question to ask
        question: String,

        /// Show iterations and tool calls
        #[arg(short, long)]
        debug: bool,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8501")]
        port: u16,
    },

    /// List the tools available to the assistant
    Tools,

    /// Replace the store database with sample data
    Seed {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// RNG seed for reproducible data
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Check configuration and connectivity
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration (secrets redacted)
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::parse_from(["lisearch", "serve"]);
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 8501);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_flags_and_seed() {
        let cli = Cli::parse_from(["lisearch", "-vv", "seed", "--yes", "--seed", "42", "-c", "x.toml"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config.as_deref(), Some("x.toml"));
        assert!(matches!(
            cli.command,
            Commands::Seed {
                yes: true,
                seed: Some(42)
            }
        ));
    }

    #[test]
    fn test_parse_ask_flags() {
        let cli = Cli::parse_from(["lisearch", "ask", "Sales summary by category", "--json"]);
        match cli.command {
            Commands::Ask {
                question,
                debug,
                json,
            } => {
                assert_eq!(question, "Sales summary by category");
                assert!(!debug);
                assert!(json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}

//! LiSearch CLI entry point.

use anyhow::Result;
use clap::Parser;
use lisearch::cli::{commands, Cli, Commands};
use lisearch::config::Settings;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Secrets usually live in .env next to where the tool is run.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("lisearch={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Load configuration
    let config_path = cli
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(Settings::default_config_path);
    let settings = Settings::load_from(Some(&config_path))?;

    // Execute command
    match &cli.command {
        Commands::Chat { debug } => {
            commands::run_chat(*debug, settings).await?;
        }

        Commands::Ask {
            question,
            debug,
            json,
        } => {
            commands::run_ask(question, *debug, *json, settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, *port, settings).await?;
        }

        Commands::Tools => {
            commands::run_tools(cli.verbose > 0)?;
        }

        Commands::Seed { yes, seed } => {
            commands::run_seed(*yes, *seed, &settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, &config_path).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, &config_path)?;
        }
    }

    Ok(())
}

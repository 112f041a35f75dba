//! Pantry CLI entry point.

use anyhow::Result;
use clap::Parser;
use pantry::cli::{commands, Cli, Commands};
use pantry::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration: defaults < config file < environment < flags
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&Settings::expand_path(path)))?,
        None => Settings::load()?,
    };
    cli.apply_overrides(&mut settings);

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("pantry={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Execute command
    match &cli.command {
        None => {
            commands::run_ask(cli.question(), !cli.no_sync, settings).await?;
        }

        Some(Commands::Sync { force }) => {
            commands::run_sync(*force, settings).await?;
        }

        Some(Commands::Search { query }) => {
            commands::run_search(query, settings).await?;
        }

        Some(Commands::Info) => {
            commands::run_info(settings).await?;
        }

        Some(Commands::Verify) => {
            commands::run_verify(settings).await?;
        }

        Some(Commands::Config { action }) => {
            commands::run_config(action, cli.config.as_deref(), settings)?;
        }
    }

    Ok(())
}

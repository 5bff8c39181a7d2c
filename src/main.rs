//! docqa CLI entry point.

use anyhow::Result;
use clap::Parser;
use docqa::cli::{commands, Cli, Commands};
use docqa::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
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
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("docqa={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let config_path = cli.config.clone().unwrap_or_else(Settings::default_config_path);
    let settings = Settings::load_from(Some(&config_path))?;

    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Ingest { path } => {
            commands::run_ingest(path, settings).await?;
        }

        Commands::Ask {
            question,
            top_k,
            model,
            json,
        } => {
            commands::run_ask(question, *top_k, model.clone(), *json, settings).await?;
        }

        Commands::Search { query, top_k } => {
            commands::run_search(query, *top_k, settings).await?;
        }

        Commands::Chat { model } => {
            commands::run_chat(model.clone(), settings).await?;
        }

        Commands::Status => {
            commands::run_status(&settings, &config_path).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, &config_path)?;
        }
    }

    Ok(())
}

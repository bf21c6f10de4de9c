//! # Seating Service Entry Point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use seating::{config::ConfigLoader, db, server::run_server, telemetry};

#[derive(Debug, Parser)]
#[command(name = "seating", version, about = "Restaurant seating service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new()
        .load()
        .context("failed to load configuration")?;
    telemetry::init_tracing(&config).context("failed to initialize tracing")?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted) = config.redacted_json() {
        tracing::debug!(config = %redacted, "Effective configuration");
    }

    let pool = db::init_pool(&config)
        .await
        .context("failed to connect to database")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            if config.run_migrations {
                db::run_migrations(&pool).await?;
            }
            run_server(config, pool).await
        }
        Command::Migrate => {
            db::run_migrations(&pool).await?;
            tracing::info!("Migrations applied");
            Ok(())
        }
    }
}

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use blu_api::config::{config, Environment};
use blu_api::database::{schema::ensure_schema, DatabaseManager};
use blu_api::state::AppState;

#[derive(Parser)]
#[command(name = "blu-api")]
#[command(about = "Blu back-office API server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Create missing tables and indexes, then exit")]
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL, JWT_SECRET and API keys are picked up
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("blu_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = config();
    info!("Starting Blu API in {:?} mode", config.environment);

    if config.uses_insecure_secret() {
        if matches!(config.environment, Environment::Production) {
            warn!("JWT_SECRET is not set: production is signing tokens with the built-in development secret");
        } else {
            warn!("JWT_SECRET is not set: using the insecure development secret");
        }
    }

    let db = DatabaseManager::connect(config).await.context("failed to connect to the database")?;
    ensure_schema(&db).await.context("failed to prepare the schema")?;

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Migrate => {
            info!("Schema is up to date");
            db.close().await;
            Ok(())
        }
        Commands::Serve { port } => serve(db, port.unwrap_or(config.server.port)).await,
    }
}

async fn serve(db: DatabaseManager, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(db.clone(), Arc::new(config().clone())).context("failed to build integration clients")?;
    let app = blu_api::app(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Blu API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

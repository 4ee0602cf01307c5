//! Ordo - liturgical calendar REST API
//!
//! "Omnia autem honeste et secundum ordinem fiant" - 1 Corinthians 14:40

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ordo::{config::Args, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("ordo={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  Ordo - Liturgical Calendar API");
    info!("  \"Secundum ordinem fiant\"");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Data dir: {}", args.data_dir.display());
    info!("Default locale: {}", args.default_locale);
    info!("======================================");

    if !args.data_dir.is_dir() {
        info!(
            "Data directory {} does not exist yet; it will be created on first write",
            args.data_dir.display()
        );
    }

    let state = Arc::new(server::AppState::new(args));
    server::run(state).await?;

    Ok(())
}

//! Matchday API Server
//!
//! Run with: cargo run
//!
//! # Configuration
//!
//! Loaded from a TOML file (`--config`), then overridden by environment
//! variables:
//! - `MATCHDAY_HOST`: Host to bind to (default: 0.0.0.0)
//! - `MATCHDAY_PORT`: Port to listen on (default: 8000)
//! - `MATCHDAY_DB_PATH`: SQLite database path (default: ./matchday.db)
//! - `MATCHDAY_LOG_LEVEL` / `MATCHDAY_LOG_FORMAT`: logging
//! - `RUST_LOG`: fine-grained filter (takes precedence)

use clap::Parser;
use matchday::api::{serve, AppState};
use matchday::config::Config;
use matchday::store::MatchStore;
use matchday::websocket::ConfigGate;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "matchday", about = "Live sports match and commentary server")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::from_env(),
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_tracing(&config);

    tracing::info!("Starting Matchday API server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Database: {}", config.database.path);

    let store = Arc::new(MatchStore::open(Path::new(&config.database.path))?);

    let gate = Arc::new(ConfigGate::new(
        config.websocket.allowed_origins.clone(),
        config.websocket.max_connections,
    ));
    let state = AppState::with_gate(store, config.websocket.hub_config(), gate);

    serve(state, &config.server.addr()).await?;

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "matchday={},tower_http=debug",
            config.logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

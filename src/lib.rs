//! # Matchday
//!
//! Live sports backend: CRUD endpoints for matches and time-stamped
//! commentary, plus a WebSocket broadcast hub that pushes newly created
//! matches and commentary to live observers without polling.
//!
//! ## Modules
//!
//! - [`store`]: SQLite persistence for matches and commentary
//! - [`api`]: REST API server with Axum
//! - [`websocket`]: connection registry, subscription index, broadcast hub
//! - [`config`]: TOML + environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use matchday::api::{serve, AppState};
//! use matchday::store::MatchStore;
//! use matchday::websocket::HubConfig;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(MatchStore::open(std::path::Path::new("matchday.db"))?);
//!     let state = AppState::new(store, HubConfig::default());
//!     serve(state, "0.0.0.0:8000").await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod store;
pub mod websocket;

// Re-export top-level types for convenience
pub use api::{build_router, serve, ApiError, ApiResult, AppState};

pub use store::{Commentary, Match, MatchStatus, MatchStore, NewCommentary, NewMatch, StoreError};

pub use websocket::{
    BroadcastHub, ClientMessage, ConfigGate, Event, EventKind, HandshakeGate, HubConfig, HubError,
    ServerMessage, GLOBAL_TOPIC,
};

pub use config::{Config, ConfigError};

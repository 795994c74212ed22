//! Matchday REST API
//!
//! HTTP API layer built with Axum.
//!
//! # Endpoints
//!
//! ## Matches
//! - `GET /matches` - List matches (newest first, `?limit=`)
//! - `POST /matches` - Create a match
//! - `GET /matches/:id` - Get a match
//! - `PATCH /matches/:id/score` - Update scores
//!
//! ## Commentary
//! - `GET /matches/:id/commentary` - List commentary for a match
//! - `POST /matches/:id/commentary` - Add commentary
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! ## WebSocket
//! - `GET /ws` - Real-time match/commentary push
//!
//! Successful writes are pushed through the broadcast hub after the
//! database insert; hub failures never surface on the HTTP path.

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::websocket::websocket_handler;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let match_routes = Router::new()
        .route("/", get(routes::matches::list_matches))
        .route("/", post(routes::matches::create_match))
        .route("/:id", get(routes::matches::get_match))
        .route("/:id/score", patch(routes::matches::update_score))
        .route("/:id/commentary", get(routes::commentary::list_commentary))
        .route("/:id/commentary", post(routes::commentary::create_commentary));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .nest("/matches", match_routes)
        .nest("/health", health_routes)
        .route("/ws", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()) // Configure properly in production
        .with_state(shared_state)
}

/// Start the API server
pub async fn serve(state: AppState, addr: &str) -> Result<(), ApiError> {
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Matchday API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Matchday API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

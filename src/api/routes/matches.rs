//! Match Routes
//!
//! CRUD endpoints for matches.
//!
//! - GET /matches - List matches (newest first)
//! - POST /matches - Create a match
//! - GET /matches/:id - Get a specific match
//! - PATCH /matches/:id/score - Update scores

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{
    CreateMatchRequest, ListQuery, MatchListResponse, MatchResponse, UpdateScoreRequest,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// GET /matches
pub async fn list_matches(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<MatchListResponse>> {
    let matches = state.store.list_matches(query.effective_limit()).await?;
    Ok(Json(MatchListResponse::new(matches)))
}

/// GET /matches/:id
pub async fn get_match(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MatchResponse>> {
    let m = state
        .store
        .get_match(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Match with id {} not found", id)))?;
    Ok(Json(MatchResponse::new(m)))
}

/// POST /matches
///
/// Persists the match, then pushes a `match.created` event to "global"
/// subscribers. The broadcast is best-effort; its failures never turn
/// the successful write into an HTTP error.
pub async fn create_match(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateMatchRequest>,
) -> ApiResult<(StatusCode, Json<MatchResponse>)> {
    let new = req.into_new_match()?;
    let created = state.store.create_match(new).await?;

    tracing::info!(match_id = created.id, sport = %created.sport, "Created match");

    match serde_json::to_value(&created) {
        Ok(payload) => state.hub.publish_match_created(payload).await,
        Err(e) => tracing::error!(error = %e, "Failed to serialize match for broadcast"),
    }

    Ok((StatusCode::CREATED, Json(MatchResponse::new(created))))
}

/// PATCH /matches/:id/score
pub async fn update_score(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateScoreRequest>,
) -> ApiResult<Json<MatchResponse>> {
    let updated = state
        .store
        .update_score(id, req.home_score, req.away_score)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Match with id {} not found", id)))?;

    tracing::info!(
        match_id = id,
        home_score = req.home_score,
        away_score = req.away_score,
        "Updated score"
    );

    Ok(Json(MatchResponse::new(updated)))
}

//! Commentary Routes
//!
//! Time-stamped commentary nested under a match.
//!
//! - GET /matches/:id/commentary - List commentary (newest first)
//! - POST /matches/:id/commentary - Add commentary

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{
    CommentaryListResponse, CommentaryResponse, CreateCommentaryRequest, ListQuery,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// GET /matches/:id/commentary
pub async fn list_commentary(
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<CommentaryListResponse>> {
    if state.store.get_match(match_id).await?.is_none() {
        return Err(ApiError::NotFound(format!(
            "Match with id {} not found",
            match_id
        )));
    }

    let entries = state
        .store
        .list_commentary(match_id, query.effective_limit())
        .await?;
    Ok(Json(CommentaryListResponse::new(entries)))
}

/// POST /matches/:id/commentary
///
/// Persists the entry, then pushes a `commentary.created` event to the
/// match topic. Broadcast failures stay inside the hub.
pub async fn create_commentary(
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<i64>,
    Json(req): Json<CreateCommentaryRequest>,
) -> ApiResult<(StatusCode, Json<CommentaryResponse>)> {
    let new = req.into_new_commentary()?;

    let created = state
        .store
        .create_commentary(match_id, new)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Match with id {} not found", match_id)))?;

    tracing::info!(
        match_id,
        commentary_id = created.id,
        minute = created.minute,
        "Created commentary"
    );

    match serde_json::to_value(&created) {
        Ok(payload) => state.hub.publish_commentary_created(match_id, payload).await,
        Err(e) => tracing::error!(error = %e, "Failed to serialize commentary for broadcast"),
    }

    Ok((StatusCode::CREATED, Json(CommentaryResponse::new(created))))
}

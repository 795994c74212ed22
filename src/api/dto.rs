//! Data Transfer Objects
//!
//! Request and response types for the API endpoints, plus their
//! validation. The public wire format is camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::store::{Commentary, Match, NewCommentary, NewMatch};

/// Hard cap on list sizes; client-supplied limits are clamped to it.
pub const MAX_LIMIT: u32 = 100;
const DEFAULT_LIMIT: u32 = 10;

// ============================================
// MATCH DTOs
// ============================================

/// Create match request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchRequest {
    pub sport: String,
    pub home_team: String,
    pub away_team: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub home_score: Option<u32>,
    #[serde(default)]
    pub away_score: Option<u32>,
}

impl CreateMatchRequest {
    /// Validate and convert into store input.
    pub fn into_new_match(self) -> ApiResult<NewMatch> {
        if self.sport.trim().is_empty() {
            return Err(ApiError::Validation("Sport is required".to_string()));
        }
        if self.home_team.trim().is_empty() {
            return Err(ApiError::Validation("Home team is required".to_string()));
        }
        if self.away_team.trim().is_empty() {
            return Err(ApiError::Validation("Away team is required".to_string()));
        }
        if self.end_time <= self.start_time {
            return Err(ApiError::Validation(
                "End time must be after start time".to_string(),
            ));
        }

        Ok(NewMatch {
            sport: self.sport,
            home_team: self.home_team,
            away_team: self.away_team,
            start_time: self.start_time,
            end_time: self.end_time,
            home_score: self.home_score.unwrap_or(0),
            away_score: self.away_score.unwrap_or(0),
        })
    }
}

/// Update score request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScoreRequest {
    pub home_score: u32,
    pub away_score: u32,
}

/// List query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub limit: Option<u32>,
}

impl ListQuery {
    /// Effective limit: default 10, clamped to [`MAX_LIMIT`].
    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
    }
}

// ============================================
// COMMENTARY DTOs
// ============================================

/// Create commentary request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentaryRequest {
    pub minute: u32,
    pub text: String,
}

impl CreateCommentaryRequest {
    pub fn into_new_commentary(self) -> ApiResult<NewCommentary> {
        if self.text.trim().is_empty() {
            return Err(ApiError::Validation(
                "Commentary text is required".to_string(),
            ));
        }
        Ok(NewCommentary {
            minute: self.minute,
            text: self.text,
        })
    }
}

// ============================================
// RESPONSE ENVELOPES
// ============================================

/// Standard success envelope for a single resource
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Success envelope for list endpoints
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub success: bool,
    pub total: usize,
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            total: data.len(),
            data,
        }
    }
}

pub type MatchResponse = DataResponse<Match>;
pub type MatchListResponse = ListResponse<Match>;
pub type CommentaryResponse = DataResponse<Commentary>;
pub type CommentaryListResponse = ListResponse<Commentary>;

//! Domain Types
//!
//! Matches and time-stamped commentary. Serialized field names are
//! camelCase, matching the public wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Scheduled,
    Live,
    Finished,
}

impl MatchStatus {
    /// Parse the persisted form. Unknown values fall back to Scheduled
    /// rather than poisoning reads.
    pub fn from_db(s: &str) -> Self {
        match s {
            "live" => MatchStatus::Live,
            "finished" => MatchStatus::Finished,
            _ => MatchStatus::Scheduled,
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Live => "live",
            MatchStatus::Finished => "finished",
        };
        write!(f, "{}", s)
    }
}

/// A persisted match
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: i64,
    pub sport: String,
    pub home_team: String,
    pub away_team: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub home_score: u32,
    pub away_score: u32,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a match (already validated upstream)
#[derive(Debug, Clone)]
pub struct NewMatch {
    pub sport: String,
    pub home_team: String,
    pub away_team: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub home_score: u32,
    pub away_score: u32,
}

/// A persisted commentary entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Commentary {
    pub id: i64,
    pub match_id: i64,
    pub minute: u32,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a commentary entry
#[derive(Debug, Clone)]
pub struct NewCommentary {
    pub minute: u32,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_status_round_trip() {
        for status in [MatchStatus::Scheduled, MatchStatus::Live, MatchStatus::Finished] {
            assert_eq!(MatchStatus::from_db(&status.to_string()), status);
        }
    }

    #[test]
    fn test_match_status_unknown_defaults_to_scheduled() {
        assert_eq!(MatchStatus::from_db("garbage"), MatchStatus::Scheduled);
    }

    #[test]
    fn test_match_serializes_camel_case() {
        let m = Match {
            id: 1,
            sport: "football".to_string(),
            home_team: "Lions".to_string(),
            away_team: "Tigers".to_string(),
            start_time: Utc::now(),
            end_time: Utc::now(),
            home_score: 0,
            away_score: 0,
            status: MatchStatus::Scheduled,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"homeTeam\":\"Lions\""));
        assert!(json.contains("\"awayScore\":0"));
        assert!(json.contains("\"status\":\"scheduled\""));
    }
}

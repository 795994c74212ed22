//! Persistence Layer
//!
//! SQLite-backed storage for matches and commentary. The connection lives
//! behind an async mutex; handlers hold it only for the duration of one
//! statement or transaction.

mod error;
mod types;

pub use error::{StoreError, StoreResult};
pub use types::{Commentary, Match, MatchStatus, NewCommentary, NewMatch};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags, Row};
use std::path::Path;
use tokio::sync::Mutex;

/// SQLite-backed store for matches and commentary
pub struct MatchStore {
    conn: Mutex<Connection>,
}

impl MatchStore {
    /// Create or open the database at `path`.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        // Configure for performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (tests).
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> StoreResult<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS matches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sport TEXT NOT NULL,
                home_team TEXT NOT NULL,
                away_team TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                home_score INTEGER NOT NULL DEFAULT 0,
                away_score INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'scheduled',
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS commentary (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                match_id INTEGER NOT NULL REFERENCES matches(id),
                minute INTEGER NOT NULL,
                text TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_commentary_match
             ON commentary(match_id, created_at)",
            [],
        )?;

        Ok(())
    }

    /// Insert a match and return the stored row.
    pub async fn create_match(&self, new: NewMatch) -> StoreResult<Match> {
        let conn = self.conn.lock().await;
        let created_at = Utc::now();

        conn.execute(
            "INSERT INTO matches
                 (sport, home_team, away_team, start_time, end_time,
                  home_score, away_score, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                new.sport,
                new.home_team,
                new.away_team,
                new.start_time.to_rfc3339(),
                new.end_time.to_rfc3339(),
                new.home_score,
                new.away_score,
                MatchStatus::Scheduled.to_string(),
                created_at.to_rfc3339(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        Ok(Match {
            id,
            sport: new.sport,
            home_team: new.home_team,
            away_team: new.away_team,
            start_time: new.start_time,
            end_time: new.end_time,
            home_score: new.home_score,
            away_score: new.away_score,
            status: MatchStatus::Scheduled,
            created_at,
        })
    }

    /// List matches, newest first.
    pub async fn list_matches(&self, limit: u32) -> StoreResult<Vec<Match>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, sport, home_team, away_team, start_time, end_time,
                    home_score, away_score, status, created_at
             FROM matches
             ORDER BY created_at DESC, id DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map([limit], row_to_match)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Fetch one match by id.
    pub async fn get_match(&self, id: i64) -> StoreResult<Option<Match>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, sport, home_team, away_team, start_time, end_time,
                    home_score, away_score, status, created_at
             FROM matches WHERE id = ?1",
        )?;

        let mut rows = stmt.query_map([id], row_to_match)?;
        rows.next().transpose().map_err(Into::into)
    }

    /// Update a match's scores. Returns the updated row, or None if the
    /// match does not exist.
    pub async fn update_score(
        &self,
        id: i64,
        home_score: u32,
        away_score: u32,
    ) -> StoreResult<Option<Match>> {
        {
            let conn = self.conn.lock().await;
            let changed = conn.execute(
                "UPDATE matches SET home_score = ?1, away_score = ?2 WHERE id = ?3",
                params![home_score, away_score, id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
        }
        self.get_match(id).await
    }

    /// Insert a commentary entry for an existing match.
    ///
    /// Returns Ok(None) when the match does not exist.
    pub async fn create_commentary(
        &self,
        match_id: i64,
        new: NewCommentary,
    ) -> StoreResult<Option<Commentary>> {
        let conn = self.conn.lock().await;

        let exists: bool = conn
            .prepare_cached("SELECT 1 FROM matches WHERE id = ?1")?
            .exists([match_id])?;
        if !exists {
            return Ok(None);
        }

        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO commentary (match_id, minute, text, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![match_id, new.minute, new.text, created_at.to_rfc3339()],
        )?;

        Ok(Some(Commentary {
            id: conn.last_insert_rowid(),
            match_id,
            minute: new.minute,
            text: new.text,
            created_at,
        }))
    }

    /// List commentary for a match, newest first.
    pub async fn list_commentary(
        &self,
        match_id: i64,
        limit: u32,
    ) -> StoreResult<Vec<Commentary>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, match_id, minute, text, created_at
             FROM commentary
             WHERE match_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![match_id, limit], row_to_commentary)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Cheap readiness probe.
    pub async fn ping(&self) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }
}

fn parse_ts(idx: usize, s: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn row_to_match(row: &Row<'_>) -> rusqlite::Result<Match> {
    let status: String = row.get(8)?;
    Ok(Match {
        id: row.get(0)?,
        sport: row.get(1)?,
        home_team: row.get(2)?,
        away_team: row.get(3)?,
        start_time: parse_ts(4, row.get::<_, String>(4)?)?,
        end_time: parse_ts(5, row.get::<_, String>(5)?)?,
        home_score: row.get(6)?,
        away_score: row.get(7)?,
        status: MatchStatus::from_db(&status),
        created_at: parse_ts(9, row.get::<_, String>(9)?)?,
    })
}

fn row_to_commentary(row: &Row<'_>) -> rusqlite::Result<Commentary> {
    Ok(Commentary {
        id: row.get(0)?,
        match_id: row.get(1)?,
        minute: row.get(2)?,
        text: row.get(3)?,
        created_at: parse_ts(4, row.get::<_, String>(4)?)?,
    })
}

//! Conversation history
//!
//! Every interaction is written to a SQLite database together with the
//! session it belongs to. Sessions carry totals that are filled in when the
//! session ends.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Bad timestamp in history: {0}")]
    Timestamp(String),
    #[error("History database lock poisoned")]
    Poisoned,
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS conversations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        input_type TEXT NOT NULL,
        user_input TEXT,
        ai_response TEXT,
        action_taken TEXT,
        online_mode BOOLEAN,
        model_used TEXT,
        processing_time_ms INTEGER,
        tokens_used INTEGER
    );

    CREATE TABLE IF NOT EXISTS sessions (
        id TEXT PRIMARY KEY,
        start_time TEXT NOT NULL,
        end_time TEXT,
        total_interactions INTEGER DEFAULT 0,
        total_tokens INTEGER DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_conversations_session ON conversations(session_id);
    CREATE INDEX IF NOT EXISTS idx_conversations_timestamp ON conversations(timestamp);
";

/// One logged interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    /// "text" or "voice"
    pub input_type: String,
    pub user_input: String,
    pub ai_response: String,
    pub action_taken: Option<String>,
    pub online_mode: bool,
    pub model_used: Option<String>,
    pub processing_time_ms: u64,
    pub tokens_used: u64,
}

impl InteractionRecord {
    pub fn new(
        session_id: impl Into<String>,
        input_type: impl Into<String>,
        user_input: impl Into<String>,
        ai_response: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            timestamp: Utc::now(),
            input_type: input_type.into(),
            user_input: user_input.into(),
            ai_response: ai_response.into(),
            action_taken: None,
            online_mode: false,
            model_used: None,
            processing_time_ms: 0,
            tokens_used: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_interactions: u64,
    pub total_tokens: u64,
}

/// Fixed-width UTC timestamps so text ordering matches time ordering
fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, HistoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| HistoryError::Timestamp(format!("{raw}: {e}")))
}

/// Raw row before timestamp parsing
struct InteractionRow {
    session_id: String,
    timestamp: String,
    input_type: String,
    user_input: Option<String>,
    ai_response: Option<String>,
    action_taken: Option<String>,
    online_mode: Option<bool>,
    model_used: Option<String>,
    processing_time_ms: Option<i64>,
    tokens_used: Option<i64>,
}

impl InteractionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            session_id: row.get(0)?,
            timestamp: row.get(1)?,
            input_type: row.get(2)?,
            user_input: row.get(3)?,
            ai_response: row.get(4)?,
            action_taken: row.get(5)?,
            online_mode: row.get(6)?,
            model_used: row.get(7)?,
            processing_time_ms: row.get(8)?,
            tokens_used: row.get(9)?,
        })
    }

    fn into_record(self) -> Result<InteractionRecord, HistoryError> {
        Ok(InteractionRecord {
            session_id: self.session_id,
            timestamp: parse_ts(&self.timestamp)?,
            input_type: self.input_type,
            user_input: self.user_input.unwrap_or_default(),
            ai_response: self.ai_response.unwrap_or_default(),
            action_taken: self.action_taken,
            online_mode: self.online_mode.unwrap_or(false),
            model_used: self.model_used,
            processing_time_ms: self.processing_time_ms.unwrap_or(0).max(0) as u64,
            tokens_used: self.tokens_used.unwrap_or(0).max(0) as u64,
        })
    }
}

/// SQLite-backed conversation log
pub struct ConversationLog {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl ConversationLog {
    /// Open (creating if needed) the database at `path`
    pub fn open(path: &Path) -> Result<Self, HistoryError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "busy_timeout", 5000)?;
        conn.execute_batch(SCHEMA)?;

        tracing::info!("Conversation database ready at {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, HistoryError>,
    ) -> Result<T, HistoryError> {
        let conn = self.conn.lock().map_err(|_| HistoryError::Poisoned)?;
        f(&conn)
    }

    /// Record the start of a session; restarting an id resets it
    pub fn start_session(&self, session_id: &str) -> Result<(), HistoryError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO sessions (id, start_time) VALUES (?1, ?2)",
                params![session_id, format_ts(&Utc::now())],
            )?;
            Ok(())
        })?;
        tracing::debug!("Session started: {}", session_id);
        Ok(())
    }

    /// Close a session and fill its totals from the logged interactions
    pub fn end_session(&self, session_id: &str) -> Result<(), HistoryError> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE sessions
                 SET end_time = ?1,
                     total_interactions = (
                         SELECT COUNT(*) FROM conversations WHERE session_id = ?2
                     ),
                     total_tokens = (
                         SELECT COALESCE(SUM(tokens_used), 0) FROM conversations
                         WHERE session_id = ?2
                     )
                 WHERE id = ?2",
                params![format_ts(&Utc::now()), session_id],
            )?;
            Ok(())
        })?;
        tracing::debug!("Session ended: {}", session_id);
        Ok(())
    }

    pub fn log_interaction(&self, record: &InteractionRecord) -> Result<(), HistoryError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO conversations (
                    session_id, timestamp, input_type, user_input, ai_response,
                    action_taken, online_mode, model_used, processing_time_ms, tokens_used
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    record.session_id,
                    format_ts(&record.timestamp),
                    record.input_type,
                    record.user_input,
                    record.ai_response,
                    record.action_taken,
                    record.online_mode,
                    record.model_used,
                    record.processing_time_ms as i64,
                    record.tokens_used as i64,
                ],
            )?;
            Ok(())
        })
    }

    /// Most recent interactions, newest first, optionally for one session
    pub fn recent(
        &self,
        session_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<InteractionRecord>, HistoryError> {
        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT session_id, timestamp, input_type, user_input, ai_response,
                        action_taken, online_mode, model_used, processing_time_ms, tokens_used
                 FROM conversations
                 WHERE ?1 IS NULL OR session_id = ?1
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![session_id, limit as i64], InteractionRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        rows.into_iter().map(InteractionRow::into_record).collect()
    }

    pub fn session(&self, session_id: &str) -> Result<Option<SessionSummary>, HistoryError> {
        let raw = self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, start_time, end_time, total_interactions, total_tokens
                     FROM sessions WHERE id = ?1",
                    params![session_id],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, Option<String>>(2)?,
                            row.get::<_, Option<i64>>(3)?,
                            row.get::<_, Option<i64>>(4)?,
                        ))
                    },
                )
                .optional()?;
            Ok(row)
        })?;

        let Some((id, start, end, interactions, tokens)) = raw else {
            return Ok(None);
        };
        Ok(Some(SessionSummary {
            id,
            start_time: parse_ts(&start)?,
            end_time: end.as_deref().map(parse_ts).transpose()?,
            total_interactions: interactions.unwrap_or(0).max(0) as u64,
            total_tokens: tokens.unwrap_or(0).max(0) as u64,
        }))
    }

    /// Delete interactions and sessions older than `days` days.
    /// Returns the number of interactions removed.
    pub fn cleanup_older_than(&self, days: u32) -> Result<usize, HistoryError> {
        let cutoff = format_ts(&(Utc::now() - Duration::days(i64::from(days))));
        let deleted = self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM conversations WHERE timestamp < ?1",
                params![cutoff],
            )?;
            conn.execute(
                "DELETE FROM sessions WHERE start_time < ?1",
                params![cutoff],
            )?;
            Ok(deleted)
        })?;

        if deleted > 0 {
            tracing::info!("Removed {} interactions older than {} days", deleted, days);
        }
        Ok(deleted)
    }
}

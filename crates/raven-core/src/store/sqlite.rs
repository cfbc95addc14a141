//! SQLite persistence for the state singleton, facts and dialog.
//!
//! One connection behind a mutex; every write is a single statement, so each
//! append and each state update is atomic on its own.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Connection};
use tracing::debug;

use crate::error::{ErrorCode, RavenError, RavenResult};
use crate::traits::{MemoryStore, StateStore};
use crate::types::{DialogMessage, EmotionalState, Fact, MessageRole};

/// SQLite-backed store for the relationship state and both logs.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    ///
    /// `":memory:"` opens an in-memory database.
    pub fn new(path: impl AsRef<Path>) -> RavenResult<Self> {
        let path = path.as_ref();
        if path.to_str() == Some(":memory:") {
            return Self::in_memory();
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        debug!(path = %path.display(), "Opening SQLite store");
        let conn = Connection::open(path).map_err(|e| RavenError::Database {
            message: format!("Failed to open {}: {}", path.display(), e),
            code: ErrorCode::DbConnectionFailed,
            source: Some(Box::new(e)),
        })?;
        Self::with_connection(conn)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> RavenResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> RavenResult<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> RavenResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RavenError::database(e.to_string()))
    }

    /// Create the three tables and seed the state row on first run.
    fn init_schema(&self) -> RavenResult<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS facts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS dialog (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            -- exactly one relationship
            CREATE TABLE IF NOT EXISTS state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                love REAL NOT NULL,
                jealousy REAL NOT NULL,
                care REAL NOT NULL,
                anger REAL NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;

        let initial = EmotionalState::default();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO state (id, love, jealousy, care, anger, updated_at)
             VALUES (1, ?1, ?2, ?3, ?4, ?5)",
            params![
                initial.love,
                initial.jealousy,
                initial.care,
                initial.anger,
                initial.updated_at.to_rfc3339()
            ],
        )?;
        if inserted > 0 {
            debug!(state = %initial.summary(), "Seeded initial emotional state");
        }

        Ok(())
    }

    /// Number of rows in the dialog log.
    pub fn message_count(&self) -> RavenResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM dialog", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Number of rows in the fact log.
    pub fn fact_count(&self) -> RavenResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM facts", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// `LIMIT` operand; sizes past `i64::MAX` saturate instead of going negative.
fn sql_limit(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn parse_timestamp(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl StateStore for SqliteStore {
    fn get_state(&self) -> RavenResult<EmotionalState> {
        let conn = self.lock()?;

        conn.query_row(
            "SELECT love, jealousy, care, anger, updated_at FROM state WHERE id = 1",
            [],
            |row| {
                Ok(EmotionalState {
                    love: row.get(0)?,
                    jealousy: row.get(1)?,
                    care: row.get(2)?,
                    anger: row.get(3)?,
                    updated_at: parse_timestamp(4, row.get(4)?)?,
                })
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => RavenError::Database {
                message: "Emotional state row is missing".to_string(),
                code: ErrorCode::DbStateMissing,
                source: None,
            },
            other => other.into(),
        })
    }

    fn set_state(&self, state: &EmotionalState) -> RavenResult<EmotionalState> {
        let mut written = state.clamped();
        written.updated_at = Utc::now();

        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE state SET love = ?1, jealousy = ?2, care = ?3, anger = ?4, updated_at = ?5
             WHERE id = 1",
            params![
                written.love,
                written.jealousy,
                written.care,
                written.anger,
                written.updated_at.to_rfc3339()
            ],
        )?;

        if updated != 1 {
            return Err(RavenError::Database {
                message: "Emotional state row is missing".to_string(),
                code: ErrorCode::DbStateMissing,
                source: None,
            });
        }

        Ok(written)
    }
}

impl MemoryStore for SqliteStore {
    fn log_message(&self, role: MessageRole, content: &str) -> RavenResult<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO dialog (role, content, created_at) VALUES (?1, ?2, ?3)",
            params![role.to_string(), content, Utc::now().to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn recent_messages(&self, n: usize) -> RavenResult<Vec<DialogMessage>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, role, content, created_at FROM dialog ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![sql_limit(n)], |row| {
            let role: String = row.get(1)?;
            let role = MessageRole::from_str(&role).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e))
            })?;
            Ok(DialogMessage {
                id: row.get(0)?,
                role,
                content: row.get(2)?,
                created_at: parse_timestamp(3, row.get(3)?)?,
            })
        })?;

        let mut messages = rows.collect::<Result<Vec<_>, _>>()?;
        messages.reverse();
        Ok(messages)
    }

    fn add_fact(&self, key: &str, value: &str) -> RavenResult<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO facts (key, value, created_at) VALUES (?1, ?2, ?3)",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn recent_facts(&self, limit: usize) -> RavenResult<Vec<Fact>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id, key, value, created_at FROM facts ORDER BY id DESC LIMIT ?1")?;

        let rows = stmt.query_map(params![sql_limit(limit)], |row| {
            Ok(Fact {
                id: row.get(0)?,
                key: row.get(1)?,
                value: row.get(2)?,
                created_at: parse_timestamp(3, row.get(3)?)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

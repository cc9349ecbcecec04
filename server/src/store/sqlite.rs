//! SQLite-backed todo store.
//!
//! # Responsibility
//! - Own the `todos` table schema and create it on open.
//! - Run blocking SQLite calls off the async executor.
//!
//! # Invariants
//! - Timestamps are stored as integer Unix milliseconds.
//! - `seq` is `AUTOINCREMENT`, so insertion order survives equal timestamps
//!   and row slots are never reused.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{next_updated_at, StoreError, StoreResult, TodoStore};
use crate::clock::{truncate_millis, Clock};
use crate::model::{NewTodo, Priority, TodoPatch, TodoRecord};

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS todos (
    seq        INTEGER PRIMARY KEY AUTOINCREMENT,
    id         TEXT    NOT NULL UNIQUE,
    title      TEXT    NOT NULL CHECK (length(trim(title)) > 0),
    done       INTEGER NOT NULL DEFAULT 0,
    priority   TEXT    NOT NULL DEFAULT 'medium'
               CHECK (priority IN ('low', 'medium', 'high')),
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS todos_created_at ON todos (created_at DESC, seq DESC);
";

const TODO_SELECT_SQL: &str = "SELECT id, title, done, priority, created_at, updated_at FROM todos";

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    clock: Arc<dyn Clock>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> StoreResult<Self> {
        Self::bootstrap(Connection::open(path)?, clock)
    }

    pub fn open_in_memory(clock: Arc<dyn Clock>) -> StoreResult<Self> {
        Self::bootstrap(Connection::open_in_memory()?, clock)
    }

    fn bootstrap(conn: Connection, clock: Arc<dyn Clock>) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            clock,
        })
    }

    async fn with_conn<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StoreError::Unavailable("connection mutex poisoned".to_string()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?
    }
}

fn millis_to_datetime(millis: i64) -> StoreResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| StoreError::Corrupt(format!("timestamp out of range: {millis}")))
}

type RawRow = (String, String, bool, String, i64, i64);

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn into_record(raw: RawRow) -> StoreResult<TodoRecord> {
    let (id, title, done, priority, created_at, updated_at) = raw;
    Ok(TodoRecord {
        id: Uuid::parse_str(&id).map_err(|e| StoreError::Corrupt(format!("id {id}: {e}")))?,
        title,
        done,
        priority: priority
            .parse::<Priority>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?,
        created_at: millis_to_datetime(created_at)?,
        updated_at: millis_to_datetime(updated_at)?,
    })
}

fn select_by_id(conn: &Connection, id: Uuid) -> StoreResult<Option<TodoRecord>> {
    let raw = conn
        .query_row(
            &format!("{TODO_SELECT_SQL} WHERE id = ?1"),
            params![id.to_string()],
            read_row,
        )
        .optional()?;
    raw.map(into_record).transpose()
}

#[async_trait]
impl TodoStore for SqliteStore {
    async fn insert(&self, todo: NewTodo) -> StoreResult<TodoRecord> {
        let now = truncate_millis(self.clock.now());
        let record = TodoRecord {
            id: Uuid::new_v4(),
            title: todo.title,
            done: false,
            priority: todo.priority,
            created_at: now,
            updated_at: now,
        };
        let row = record.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO todos (id, title, done, priority, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    row.id.to_string(),
                    row.title,
                    row.done,
                    row.priority.as_str(),
                    row.created_at.timestamp_millis(),
                    row.updated_at.timestamp_millis(),
                ],
            )?;
            Ok(())
        })
        .await?;
        Ok(record)
    }

    async fn list_recent(&self, limit: usize) -> StoreResult<Vec<TodoRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{TODO_SELECT_SQL} ORDER BY created_at DESC, seq DESC LIMIT ?1"
            ))?;
            let rows = stmt
                .query_map(params![limit], read_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows.into_iter().map(into_record).collect()
        })
        .await
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<TodoRecord>> {
        self.with_conn(move |conn| select_by_id(conn, id)).await
    }

    async fn update(&self, id: Uuid, patch: TodoPatch) -> StoreResult<Option<TodoRecord>> {
        let now = truncate_millis(self.clock.now());
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let Some(mut record) = select_by_id(&tx, id)? else {
                return Ok(None);
            };
            patch.apply(&mut record);
            record.updated_at = next_updated_at(record.updated_at, now);
            tx.execute(
                "UPDATE todos SET title = ?2, done = ?3, priority = ?4, updated_at = ?5
                 WHERE id = ?1",
                params![
                    id.to_string(),
                    record.title,
                    record.done,
                    record.priority.as_str(),
                    record.updated_at.timestamp_millis(),
                ],
            )?;
            tx.commit()?;
            Ok(Some(record))
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        self.with_conn(move |conn| {
            let removed = conn.execute("DELETE FROM todos WHERE id = ?1", params![id.to_string()])?;
            Ok(removed > 0)
        })
        .await
    }
}

//! Persistence contract for todos and its backends.
//!
//! # Design
//! Handlers only see [`TodoStore`]. A store owns id generation and
//! timestamps; callers hand it validated input and get full records back.
//! Each operation is atomic per id; concurrent writes to one id resolve
//! last-write-wins.
//!
//! # Invariants
//! - `created_at` is set once at insert.
//! - `updated_at` strictly increases on every mutation of a record.
//! - Listing is newest first; equal `created_at` values fall back to
//!   insertion order.

mod memory;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::clock::Clock;
use crate::model::{NewTodo, TodoPatch, TodoRecord};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("unsupported database url: {0}")]
    UnsupportedUrl(String),
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn insert(&self, todo: NewTodo) -> StoreResult<TodoRecord>;

    /// At most `limit` records, newest first.
    async fn list_recent(&self, limit: usize) -> StoreResult<Vec<TodoRecord>>;

    async fn find(&self, id: Uuid) -> StoreResult<Option<TodoRecord>>;

    /// Returns the record after the patch, or `None` if `id` is unknown.
    async fn update(&self, id: Uuid, patch: TodoPatch) -> StoreResult<Option<TodoRecord>>;

    /// Returns `false` if `id` is unknown.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

/// Next `updated_at` for a record last touched at `previous`.
pub(crate) fn next_updated_at(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let floor = previous + Duration::milliseconds(1);
    if now < floor {
        floor
    } else {
        now
    }
}

/// Open the backend named by a database URL.
///
/// - `memory://` keeps todos in process memory.
/// - `sqlite::memory:` is a private in-memory SQLite database.
/// - `sqlite://<path>` or a bare filesystem path opens (or creates) a SQLite file.
pub fn open_store(database_url: &str, clock: Arc<dyn Clock>) -> StoreResult<Arc<dyn TodoStore>> {
    let url = database_url.trim();
    if url == "memory://" || url == "memory" {
        tracing::info!(backend = "memory", "opening todo store");
        return Ok(Arc::new(MemoryStore::new(clock)));
    }
    if url == "sqlite::memory:" {
        tracing::info!(backend = "sqlite", mode = "memory", "opening todo store");
        return Ok(Arc::new(SqliteStore::open_in_memory(clock)?));
    }
    let path = match url.strip_prefix("sqlite://") {
        Some(path) => path,
        None if !url.contains("://") && !url.is_empty() => url,
        None => return Err(StoreError::UnsupportedUrl(url.to_string())),
    };
    if path.is_empty() {
        return Err(StoreError::UnsupportedUrl(url.to_string()));
    }
    tracing::info!(backend = "sqlite", mode = "file", path, "opening todo store");
    Ok(Arc::new(SqliteStore::open(path, clock)?))
}

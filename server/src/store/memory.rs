use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{next_updated_at, StoreResult, TodoStore};
use crate::clock::{truncate_millis, Clock};
use crate::model::{NewTodo, TodoPatch, TodoRecord};

#[derive(Debug)]
struct Entry {
    seq: u64,
    record: TodoRecord,
}

#[derive(Debug, Default)]
struct Inner {
    todos: HashMap<Uuid, Entry>,
    next_seq: u64,
}

/// Todos held in process memory behind an async `RwLock`. Lost on restart.
pub struct MemoryStore {
    inner: RwLock<Inner>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            clock,
        }
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
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
        let mut inner = self.inner.write().await;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.todos.insert(
            record.id,
            Entry {
                seq,
                record: record.clone(),
            },
        );
        Ok(record)
    }

    async fn list_recent(&self, limit: usize) -> StoreResult<Vec<TodoRecord>> {
        let inner = self.inner.read().await;
        let mut entries: Vec<&Entry> = inner.todos.values().collect();
        entries.sort_by(|a, b| {
            b.record
                .created_at
                .cmp(&a.record.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(entries
            .into_iter()
            .take(limit)
            .map(|e| e.record.clone())
            .collect())
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<TodoRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.todos.get(&id).map(|e| e.record.clone()))
    }

    async fn update(&self, id: Uuid, patch: TodoPatch) -> StoreResult<Option<TodoRecord>> {
        let now = truncate_millis(self.clock.now());
        let mut inner = self.inner.write().await;
        let Some(entry) = inner.todos.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply(&mut entry.record);
        entry.record.updated_at = next_updated_at(entry.record.updated_at, now);
        Ok(Some(entry.record.clone()))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.todos.remove(&id).is_some())
    }
}

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

use todo_server::model::{NewTodo, TodoPatch};
use todo_server::{open_store, Clock, ManualClock, Priority, SqliteStore, TodoStore};

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 0).unwrap(),
    ))
}

fn new_todo(title: &str, priority: Priority) -> NewTodo {
    NewTodo {
        title: title.to_string(),
        priority,
    }
}

#[tokio::test]
async fn insert_and_find_roundtrip() {
    let clock = clock();
    let store = SqliteStore::open_in_memory(clock.clone()).unwrap();

    let created = store.insert(new_todo("first", Priority::High)).await.unwrap();
    assert!(!created.done);
    assert_eq!(created.created_at, clock.now());

    let loaded = store.find(created.id).await.unwrap().unwrap();
    assert_eq!(loaded, created);
    assert!(store.find(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_orders_newest_first_and_honours_limit() {
    let clock = clock();
    let store = SqliteStore::open_in_memory(clock.clone()).unwrap();

    let mut ids = Vec::new();
    for i in 0..5 {
        ids.push(store.insert(new_todo(&format!("t{i}"), Priority::Medium)).await.unwrap().id);
        if i % 2 == 0 {
            clock.advance(Duration::seconds(1));
        }
    }
    ids.reverse();

    let listed: Vec<Uuid> = store.list_recent(100).await.unwrap().iter().map(|r| r.id).collect();
    assert_eq!(listed, ids);
    assert_eq!(store.list_recent(3).await.unwrap().len(), 3);
}

#[tokio::test]
async fn update_applies_partial_patch() {
    let clock = clock();
    let store = SqliteStore::open_in_memory(clock.clone()).unwrap();
    let created = store.insert(new_todo("draft", Priority::Medium)).await.unwrap();

    let patch = TodoPatch {
        done: Some(true),
        ..TodoPatch::default()
    };
    let updated = store.update(created.id, patch).await.unwrap().unwrap();
    assert!(updated.done);
    assert_eq!(updated.title, "draft");
    assert_eq!(updated.priority, Priority::Medium);
    assert!(updated.updated_at > created.updated_at);

    clock.advance(Duration::minutes(3));
    let patch = TodoPatch {
        title: Some("final".to_string()),
        priority: Some(Priority::Low),
        ..TodoPatch::default()
    };
    let renamed = store.update(created.id, patch).await.unwrap().unwrap();
    assert_eq!(renamed.title, "final");
    assert_eq!(renamed.priority, Priority::Low);
    assert!(renamed.done);
    assert_eq!(renamed.updated_at, clock.now());
    assert_eq!(renamed.created_at, created.created_at);

    assert!(store
        .update(Uuid::new_v4(), TodoPatch::default())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn delete_reports_absence() {
    let store = SqliteStore::open_in_memory(clock()).unwrap();
    let created = store.insert(new_todo("gone", Priority::Low)).await.unwrap();
    assert!(store.delete(created.id).await.unwrap());
    assert!(!store.delete(created.id).await.unwrap());
    assert!(store.list_recent(100).await.unwrap().is_empty());
}

#[tokio::test]
async fn file_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("todos.db");
    let url = format!("sqlite://{}", path.display());
    let clock: Arc<dyn Clock> = clock();

    let id = {
        let store = open_store(&url, clock.clone()).unwrap();
        store.insert(new_todo("persisted", Priority::High)).await.unwrap().id
    };

    let store = open_store(&url, clock).unwrap();
    let loaded = store.find(id).await.unwrap().unwrap();
    assert_eq!(loaded.title, "persisted");
    assert_eq!(loaded.priority, Priority::High);
}

//! Todo records and their JSON representation.
//!
//! # Design
//! `TodoRecord` is what a store holds; `TodoView` is what goes over the wire.
//! The view carries the derived `timeAgo` string, computed from an explicit
//! `now` at render time and never persisted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::clock::time_ago;

pub const TITLE_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown priority: {0}")]
pub struct UnknownPriority(pub String);

impl FromStr for Priority {
    type Err = UnknownPriority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(UnknownPriority(other.to_string())),
        }
    }
}

/// A todo as held by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoRecord {
    pub id: Uuid,
    pub title: String,
    pub done: bool,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new todo. The title is already trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub priority: Priority,
}

/// Validated partial update. `None` leaves the stored field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub done: Option<bool>,
    pub priority: Option<Priority>,
}

impl TodoPatch {
    pub fn apply(&self, record: &mut TodoRecord) {
        if let Some(title) = &self.title {
            record.title = title.clone();
        }
        if let Some(done) = self.done {
            record.done = done;
        }
        if let Some(priority) = self.priority {
            record.priority = priority;
        }
    }
}

/// Wire shape of a todo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TodoView {
    pub id: Uuid,
    pub title: String,
    pub done: bool,
    pub priority: Priority,
    pub created_at: String,
    pub updated_at: String,
    pub time_ago: String,
}

impl TodoView {
    pub fn render(record: &TodoRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            done: record.done,
            priority: record.priority,
            created_at: iso8601(record.created_at),
            updated_at: iso8601(record.updated_at),
            time_ago: time_ago(record.created_at, now),
        }
    }
}

/// `2024-03-01T12:00:00.000Z`
pub fn iso8601(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

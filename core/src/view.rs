//! State machine for the todo list screen.
//!
//! # Design
//! `TodoListView` is a reducer: [`TodoListView::handle`] takes an [`Event`]
//! (a user action or the outcome of a request) plus the current time and
//! returns the [`Effect`]s the host must perform. Results of those effects
//! come back as further events. The view never performs I/O and never reads
//! the clock on its own.
//!
//! # Invariants
//! - At most one notification is visible; a new one replaces it and restarts
//!   its three-second lifetime.
//! - Apart from `Add`, which prepends the returned record, a successful
//!   mutation refreshes the whole list instead of patching it locally.
//! - A rename shows the new title immediately and restores the prior title
//!   if the update fails.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::types::{CreateTodo, Todo};

pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

/// The single notification banner and its dismissal deadline.
#[derive(Debug, Default)]
pub struct Notifications {
    current: Option<(Notification, Instant)>,
}

impl Notifications {
    pub fn show(&mut self, notification: Notification, now: Instant) {
        self.current = Some((notification, now + NOTIFICATION_TTL));
    }

    pub fn visible(&self, now: Instant) -> Option<&Notification> {
        match &self.current {
            Some((notification, deadline)) if now < *deadline => Some(notification),
            _ => None,
        }
    }

    /// When the visible notification should be dismissed.
    pub fn deadline(&self) -> Option<Instant> {
        self.current.as_ref().map(|(_, deadline)| *deadline)
    }

    /// Drop the notification once its deadline has passed. Returns `true` if
    /// one was dismissed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListState {
    Loading,
    Ready,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowMode {
    Display,
    Editing { draft: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Add,
    Toggle,
    Rename,
    Delete,
}

impl Action {
    fn failure_message(self) -> &'static str {
        match self {
            Action::Add => "Failed to add todo",
            Action::Toggle => "Failed to toggle todo",
            Action::Rename => "Failed to update todo",
            Action::Delete => "Failed to delete todo",
        }
    }
}

/// Work the host must carry out on behalf of the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchList,
    Create(CreateTodo),
    SetDone { id: Uuid, done: bool },
    Rename { id: Uuid, title: String },
    Delete(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The screen was opened.
    Mounted,
    /// The retry affordance of the error state was used.
    Retry,
    Loaded(Vec<Todo>),
    LoadFailed(String),

    Add(String),
    Added(Todo),

    Toggle(Uuid),
    Toggled(Todo),

    StartEdit(Uuid),
    EditDraft(Uuid, String),
    SaveEdit(Uuid),
    CancelEdit(Uuid),
    /// The edit field lost focus. Behaves as `SaveEdit`.
    Blur(Uuid),
    Renamed(Todo),

    Delete(Uuid),
    Deleted(Uuid),

    Failed {
        action: Action,
        id: Option<Uuid>,
        message: String,
    },

    /// The user closed the notification banner.
    Dismiss,

    /// Time passed; expire the notification if due.
    Tick,
}

/// A rename shown ahead of the server's answer.
#[derive(Debug, Clone)]
struct PendingRename {
    prior: String,
    title: String,
}

#[derive(Debug)]
pub struct TodoListView {
    state: ListState,
    todos: Vec<Todo>,
    rows: HashMap<Uuid, RowMode>,
    renames: HashMap<Uuid, PendingRename>,
    notifications: Notifications,
}

impl Default for TodoListView {
    fn default() -> Self {
        Self::new()
    }
}

impl TodoListView {
    pub fn new() -> Self {
        Self {
            state: ListState::Loading,
            todos: Vec::new(),
            rows: HashMap::new(),
            renames: HashMap::new(),
            notifications: Notifications::default(),
        }
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn row_mode(&self, id: Uuid) -> RowMode {
        self.rows.get(&id).cloned().unwrap_or(RowMode::Display)
    }

    pub fn notification(&self, now: Instant) -> Option<&Notification> {
        self.notifications.visible(now)
    }

    pub fn notification_deadline(&self) -> Option<Instant> {
        self.notifications.deadline()
    }

    fn todo_mut(&mut self, id: Uuid) -> Option<&mut Todo> {
        self.todos.iter_mut().find(|t| t.id == id)
    }

    fn notify(&mut self, notification: Notification, now: Instant) {
        self.notifications.show(notification, now);
    }

    pub fn handle(&mut self, event: Event, now: Instant) -> Vec<Effect> {
        match event {
            Event::Mounted => {
                self.state = ListState::Loading;
                vec![Effect::FetchList]
            }
            Event::Retry => {
                if !matches!(self.state, ListState::Error(_)) {
                    return Vec::new();
                }
                self.state = ListState::Loading;
                vec![Effect::FetchList]
            }
            Event::Loaded(todos) => {
                self.todos = todos;
                let present: Vec<Uuid> = self.todos.iter().map(|t| t.id).collect();
                self.rows.retain(|id, _| present.contains(id));
                self.renames.retain(|id, _| present.contains(id));
                // In-flight renames stay visible until their outcome arrives.
                for (id, rename) in &self.renames {
                    if let Some(todo) = self.todos.iter_mut().find(|t| t.id == *id) {
                        todo.title = rename.title.clone();
                    }
                }
                self.state = ListState::Ready;
                Vec::new()
            }
            Event::LoadFailed(message) => {
                match self.state {
                    ListState::Ready => {
                        self.notify(Notification::error(format!("Failed to load todos: {message}")), now)
                    }
                    _ => self.state = ListState::Error(message),
                }
                Vec::new()
            }

            Event::Add(title) => {
                if title.trim().is_empty() {
                    return Vec::new();
                }
                vec![Effect::Create(CreateTodo {
                    title,
                    priority: None,
                })]
            }
            Event::Added(todo) => {
                self.todos.insert(0, todo);
                self.notify(Notification::success("Todo added"), now);
                Vec::new()
            }

            Event::Toggle(id) => match self.todos.iter().find(|t| t.id == id) {
                Some(todo) => vec![Effect::SetDone {
                    id,
                    done: !todo.done,
                }],
                None => Vec::new(),
            },
            Event::Toggled(_) => {
                self.notify(Notification::success("Todo updated"), now);
                vec![Effect::FetchList]
            }

            Event::StartEdit(id) => {
                if let Some(todo) = self.todos.iter().find(|t| t.id == id) {
                    let draft = todo.title.clone();
                    self.rows.insert(id, RowMode::Editing { draft });
                }
                Vec::new()
            }
            Event::EditDraft(id, text) => {
                if let Some(RowMode::Editing { draft }) = self.rows.get_mut(&id) {
                    *draft = text;
                }
                Vec::new()
            }
            Event::SaveEdit(id) | Event::Blur(id) => self.save_edit(id),
            Event::CancelEdit(id) => {
                self.rows.remove(&id);
                Vec::new()
            }
            Event::Renamed(todo) => {
                self.renames.remove(&todo.id);
                self.notify(Notification::success("Todo updated"), now);
                vec![Effect::FetchList]
            }

            Event::Delete(id) => vec![Effect::Delete(id)],
            Event::Deleted(_) => {
                self.notify(Notification::success("Todo deleted"), now);
                vec![Effect::FetchList]
            }

            Event::Failed {
                action,
                id,
                message,
            } => {
                if let (Action::Rename, Some(id)) = (action, id) {
                    if let Some(rename) = self.renames.remove(&id) {
                        if let Some(todo) = self.todo_mut(id) {
                            todo.title = rename.prior;
                        }
                    }
                }
                let text = if message.is_empty() {
                    action.failure_message().to_string()
                } else {
                    message
                };
                self.notify(Notification::error(text), now);
                Vec::new()
            }

            Event::Dismiss => {
                self.notifications.dismiss();
                Vec::new()
            }
            Event::Tick => {
                self.notifications.tick(now);
                Vec::new()
            }
        }
    }

    fn save_edit(&mut self, id: Uuid) -> Vec<Effect> {
        let Some(RowMode::Editing { draft }) = self.rows.remove(&id) else {
            return Vec::new();
        };
        let title = draft.trim().to_string();
        let Some(todo) = self.todo_mut(id) else {
            return Vec::new();
        };
        if title.is_empty() || title == todo.title {
            return Vec::new();
        }
        let prior = std::mem::replace(&mut todo.title, title.clone());
        let prior = match self.renames.remove(&id) {
            Some(earlier) => earlier.prior,
            None => prior,
        };
        self.renames.insert(
            id,
            PendingRename {
                prior,
                title: title.clone(),
            },
        );
        vec![Effect::Rename { id, title }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Priority;
    use chrono::{TimeZone, Utc};

    fn todo(n: u128, title: &str, done: bool) -> Todo {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Todo {
            id: Uuid::from_u128(n),
            title: title.to_string(),
            done,
            priority: Priority::Medium,
            created_at: at,
            updated_at: at,
            time_ago: None,
        }
    }

    fn ready(todos: Vec<Todo>) -> (TodoListView, Instant) {
        let now = Instant::now();
        let mut view = TodoListView::new();
        assert_eq!(view.handle(Event::Mounted, now), vec![Effect::FetchList]);
        view.handle(Event::Loaded(todos), now);
        (view, now)
    }

    #[test]
    fn initial_load_success_and_failure() {
        let now = Instant::now();
        let mut view = TodoListView::new();
        assert_eq!(view.state(), &ListState::Loading);
        view.handle(Event::Mounted, now);
        view.handle(Event::LoadFailed("HTTP 500".into()), now);
        assert_eq!(view.state(), &ListState::Error("HTTP 500".into()));

        assert_eq!(view.handle(Event::Retry, now), vec![Effect::FetchList]);
        assert_eq!(view.state(), &ListState::Loading);
        view.handle(Event::Loaded(vec![todo(1, "a", false)]), now);
        assert_eq!(view.state(), &ListState::Ready);
        assert_eq!(view.todos().len(), 1);
    }

    #[test]
    fn retry_is_ignored_outside_error_state() {
        let (mut view, now) = ready(vec![]);
        assert!(view.handle(Event::Retry, now).is_empty());
    }

    #[test]
    fn refresh_failure_keeps_list_and_notifies() {
        let (mut view, now) = ready(vec![todo(1, "a", false)]);
        view.handle(Event::LoadFailed("offline".into()), now);
        assert_eq!(view.state(), &ListState::Ready);
        assert_eq!(view.todos().len(), 1);
        let banner = view.notification(now).unwrap();
        assert_eq!(banner.kind, NotificationKind::Error);
        assert_eq!(banner.message, "Failed to load todos: offline");
    }

    #[test]
    fn add_prepends_server_record_without_refetch() {
        let (mut view, now) = ready(vec![todo(1, "old", false)]);
        assert!(view.handle(Event::Add("   ".into()), now).is_empty());
        assert_eq!(
            view.handle(Event::Add("new".into()), now),
            vec![Effect::Create(CreateTodo {
                title: "new".into(),
                priority: None
            })]
        );
        assert!(view.handle(Event::Added(todo(2, "new", false)), now).is_empty());
        assert_eq!(view.todos()[0].title, "new");
        assert_eq!(view.notification(now).unwrap().message, "Todo added");
    }

    #[test]
    fn toggle_and_delete_refetch_on_success() {
        let (mut view, now) = ready(vec![todo(1, "a", true)]);
        let id = Uuid::from_u128(1);
        assert_eq!(
            view.handle(Event::Toggle(id), now),
            vec![Effect::SetDone { id, done: false }]
        );
        assert_eq!(
            view.handle(Event::Toggled(todo(1, "a", false)), now),
            vec![Effect::FetchList]
        );
        assert_eq!(view.handle(Event::Delete(id), now), vec![Effect::Delete(id)]);
        assert_eq!(view.handle(Event::Deleted(id), now), vec![Effect::FetchList]);
        assert_eq!(view.notification(now).unwrap().message, "Todo deleted");
    }

    #[test]
    fn save_submits_trimmed_changed_title() {
        let (mut view, now) = ready(vec![todo(1, "walk dog", false)]);
        let id = Uuid::from_u128(1);
        view.handle(Event::StartEdit(id), now);
        assert_eq!(
            view.row_mode(id),
            RowMode::Editing {
                draft: "walk dog".into()
            }
        );
        view.handle(Event::EditDraft(id, "  walk cat ".into()), now);
        assert_eq!(
            view.handle(Event::SaveEdit(id), now),
            vec![Effect::Rename {
                id,
                title: "walk cat".into()
            }]
        );
        assert_eq!(view.row_mode(id), RowMode::Display);
        assert_eq!(view.todos()[0].title, "walk cat");
    }

    #[test]
    fn save_without_change_or_with_blank_title_just_exits() {
        let (mut view, now) = ready(vec![todo(1, "same", false)]);
        let id = Uuid::from_u128(1);
        for draft in ["same", "  same  ", "   "] {
            view.handle(Event::StartEdit(id), now);
            view.handle(Event::EditDraft(id, draft.into()), now);
            assert!(view.handle(Event::SaveEdit(id), now).is_empty(), "{draft:?}");
            assert_eq!(view.row_mode(id), RowMode::Display);
            assert_eq!(view.todos()[0].title, "same");
        }
    }

    #[test]
    fn blur_behaves_as_save() {
        let (mut view, now) = ready(vec![todo(1, "a", false)]);
        let id = Uuid::from_u128(1);
        view.handle(Event::StartEdit(id), now);
        view.handle(Event::EditDraft(id, "b".into()), now);
        assert_eq!(
            view.handle(Event::Blur(id), now),
            vec![Effect::Rename {
                id,
                title: "b".into()
            }]
        );
    }

    #[test]
    fn cancel_discards_draft() {
        let (mut view, now) = ready(vec![todo(1, "keep", false)]);
        let id = Uuid::from_u128(1);
        view.handle(Event::StartEdit(id), now);
        view.handle(Event::EditDraft(id, "discard".into()), now);
        assert!(view.handle(Event::CancelEdit(id), now).is_empty());
        assert_eq!(view.row_mode(id), RowMode::Display);
        assert_eq!(view.todos()[0].title, "keep");
        // Blur after cancel is a no-op.
        assert!(view.handle(Event::Blur(id), now).is_empty());
    }

    #[test]
    fn failed_rename_restores_prior_title() {
        let (mut view, now) = ready(vec![todo(1, "before", false)]);
        let id = Uuid::from_u128(1);
        view.handle(Event::StartEdit(id), now);
        view.handle(Event::EditDraft(id, "after".into()), now);
        view.handle(Event::SaveEdit(id), now);
        assert_eq!(view.todos()[0].title, "after");

        view.handle(
            Event::Failed {
                action: Action::Rename,
                id: Some(id),
                message: "Title cannot exceed 500 characters".into(),
            },
            now,
        );
        assert_eq!(view.todos()[0].title, "before");
        let banner = view.notification(now).unwrap();
        assert_eq!(banner.kind, NotificationKind::Error);
        assert_eq!(banner.message, "Title cannot exceed 500 characters");
    }

    #[test]
    fn refresh_during_rename_keeps_speculative_title() {
        let (mut view, now) = ready(vec![todo(1, "before", false)]);
        let id = Uuid::from_u128(1);
        view.handle(Event::StartEdit(id), now);
        view.handle(Event::EditDraft(id, "after".into()), now);
        view.handle(Event::SaveEdit(id), now);
        view.handle(Event::Loaded(vec![todo(1, "before", false)]), now);
        assert_eq!(view.todos()[0].title, "after");

        assert_eq!(
            view.handle(Event::Renamed(todo(1, "after", false)), now),
            vec![Effect::FetchList]
        );
        view.handle(Event::Loaded(vec![todo(1, "after", false)]), now);
        assert_eq!(view.todos()[0].title, "after");
    }

    #[test]
    fn failure_without_message_uses_action_text() {
        let (mut view, now) = ready(vec![]);
        view.handle(
            Event::Failed {
                action: Action::Delete,
                id: None,
                message: String::new(),
            },
            now,
        );
        assert_eq!(view.notification(now).unwrap().message, "Failed to delete todo");
    }

    #[test]
    fn notification_expires_after_three_seconds() {
        let (mut view, now) = ready(vec![]);
        view.handle(Event::Added(todo(1, "a", false)), now);
        assert!(view.notification(now + Duration::from_millis(2999)).is_some());
        assert!(view.notification(now + NOTIFICATION_TTL).is_none());

        view.handle(Event::Tick, now + Duration::from_secs(1));
        assert!(view.notification_deadline().is_some());
        view.handle(Event::Tick, now + NOTIFICATION_TTL);
        assert!(view.notification_deadline().is_none());
    }

    #[test]
    fn dismiss_closes_banner_before_deadline() {
        let (mut view, now) = ready(vec![]);
        view.handle(
            Event::Failed {
                action: Action::Add,
                id: None,
                message: "Title cannot be empty".into(),
            },
            now,
        );
        assert!(view.notification(now).is_some());

        let soon = now + Duration::from_millis(500);
        assert!(view.handle(Event::Dismiss, soon).is_empty());
        assert!(view.notification(soon).is_none());
        assert!(view.notification_deadline().is_none());
    }

    #[test]
    fn new_notification_replaces_and_restarts_timer() {
        let (mut view, start) = ready(vec![todo(1, "a", false)]);
        view.handle(Event::Added(todo(2, "b", false)), start);
        let later = start + Duration::from_secs(2);
        view.handle(Event::Deleted(Uuid::from_u128(2)), later);

        assert_eq!(view.notification_deadline(), Some(later + NOTIFICATION_TTL));
        let at = start + Duration::from_secs(4);
        assert_eq!(view.notification(at).unwrap().message, "Todo deleted");
    }
}

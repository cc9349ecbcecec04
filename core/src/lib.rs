//! Synchronous client core for the todo service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern), and models the todo list
//! screen as an explicit state machine.
//!
//! # Design
//! - `TodoClient` is stateless: it holds only `base_url`.
//! - Each operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes response), so the I/O boundary is explicit.
//! - `TodoListView` is a reducer from events to effects; `Session` runs those
//!   effects through a host `Transport`.
//! - DTOs are defined independently from the server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod error;
pub mod http;
pub mod session;
pub mod types;
pub mod view;

pub use client::TodoClient;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use session::{Session, Transport};
pub use types::{CreateTodo, Health, Priority, Todo, UpdateTodo};
pub use view::{
    Action, Effect, Event, ListState, Notification, NotificationKind, RowMode, TodoListView,
    NOTIFICATION_TTL,
};

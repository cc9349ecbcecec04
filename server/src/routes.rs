//! HTTP handlers for `/api`.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::ApiError;
use crate::model::{iso8601, TodoView};
use crate::store::TodoStore;
use crate::BODY_LIMIT_BYTES;
use crate::validate::{validate_create, validate_update, CreateTodoBody, UpdateTodoBody};

/// Upper bound on todos returned by a list call.
pub const LIST_LIMIT: usize = 100;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TodoStore>,
    pub clock: Arc<dyn Clock>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn TodoStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            started_at: Instant::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub timestamp: String,
    pub uptime: f64,
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::InvalidId(raw.to_string()))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(inner)| inner).map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge {
                limit: BODY_LIMIT_BYTES,
            }
        } else {
            ApiError::MalformedBody(rejection.body_text())
        }
    })
}

pub async fn list_todos(State(state): State<AppState>) -> Result<Json<Vec<TodoView>>, ApiError> {
    let records = state.store.list_recent(LIST_LIMIT).await?;
    let now = state.clock.now();
    Ok(Json(records.iter().map(|r| TodoView::render(r, now)).collect()))
}

pub async fn create_todo(
    State(state): State<AppState>,
    body: Result<Json<CreateTodoBody>, JsonRejection>,
) -> Result<(StatusCode, Json<TodoView>), ApiError> {
    let input = validate_create(json_body(body)?)?;
    let record = state.store.insert(input).await?;
    tracing::info!(id = %record.id, "todo created");
    Ok((
        StatusCode::CREATED,
        Json(TodoView::render(&record, state.clock.now())),
    ))
}

pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateTodoBody>, JsonRejection>,
) -> Result<Json<TodoView>, ApiError> {
    let id = parse_id(&id)?;
    let patch = validate_update(json_body(body)?)?;
    let record = state
        .store
        .update(id, patch)
        .await?
        .ok_or(ApiError::NotFound)?;
    tracing::info!(%id, "todo updated");
    Ok(Json(TodoView::render(&record, state.clock.now())))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    if !state.store.delete(id).await? {
        return Err(ApiError::NotFound);
    }
    tracing::info!(%id, "todo deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "OK".to_string(),
        timestamp: iso8601(state.clock.now()),
        uptime: state.started_at.elapsed().as_secs_f64(),
    })
}

pub async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}

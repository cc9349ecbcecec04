//! Stateless HTTP request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds only a `base_url` and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The caller executes the actual HTTP round-trip, keeping the core
//! deterministic and free of I/O dependencies.

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CreateTodo, Health, Todo, UpdateTodo};

/// Synchronous, stateless client for the todo API rooted at `{base_url}/api`.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{path}", self.base_url)
    }

    fn bodiless(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest {
            method,
            path: self.url(path),
            headers: Vec::new(),
            body: None,
        }
    }

    fn with_json<T: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        payload: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(payload).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest {
            method,
            path: self.url(path),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    pub fn build_list_todos(&self) -> HttpRequest {
        self.bodiless(HttpMethod::Get, "/todos")
    }

    pub fn build_create_todo(&self, input: &CreateTodo) -> Result<HttpRequest, ApiError> {
        self.with_json(HttpMethod::Post, "/todos", input)
    }

    pub fn build_update_todo(&self, id: Uuid, input: &UpdateTodo) -> Result<HttpRequest, ApiError> {
        self.with_json(HttpMethod::Patch, &format!("/todos/{id}"), input)
    }

    pub fn build_delete_todo(&self, id: Uuid) -> HttpRequest {
        self.bodiless(HttpMethod::Delete, &format!("/todos/{id}"))
    }

    pub fn build_health(&self) -> HttpRequest {
        self.bodiless(HttpMethod::Get, "/health")
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<Vec<Todo>, ApiError> {
        check_status(&response, 200)?;
        decode(&response)
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, 201)?;
        decode(&response)
    }

    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, 200)?;
        decode(&response)
    }

    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)
    }

    pub fn parse_health(&self, response: HttpResponse) -> Result<Health, ApiError> {
        check_status(&response, 200)?;
        decode(&response)
    }
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    Err(ApiError::from_status(response.status, &response.body))
}

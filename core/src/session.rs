//! Drives a [`TodoListView`] against a live API.
//!
//! # Design
//! The host supplies a [`Transport`] that performs one HTTP round-trip.
//! `Session` runs every effect the view asks for through the
//! [`TodoClient`] build/parse pair and feeds each outcome back into the view
//! until it asks for nothing more. Calls are sequential; there is no request
//! de-duplication or cancellation.

use std::collections::VecDeque;
use std::time::Instant;

use crate::client::TodoClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::UpdateTodo;
use crate::view::{Action, Effect, Event, TodoListView};

/// Executes a single HTTP request. Non-2xx statuses are responses, not errors;
/// `Err` means no response was received.
pub trait Transport {
    fn execute(&mut self, request: HttpRequest) -> Result<HttpResponse, String>;
}

pub struct Session<T> {
    client: TodoClient,
    transport: T,
    view: TodoListView,
}

impl<T: Transport> Session<T> {
    pub fn new(client: TodoClient, transport: T) -> Self {
        Self {
            client,
            transport,
            view: TodoListView::new(),
        }
    }

    pub fn view(&self) -> &TodoListView {
        &self.view
    }

    /// Apply a user event and run every resulting effect to completion.
    pub fn dispatch(&mut self, event: Event, now: Instant) {
        let mut queue: VecDeque<Effect> = self.view.handle(event, now).into();
        while let Some(effect) = queue.pop_front() {
            tracing::debug!(?effect, "performing effect");
            let outcome = self.perform(effect);
            queue.extend(self.view.handle(outcome, now));
        }
    }

    fn send(&mut self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.transport.execute(request).map_err(ApiError::Transport)
    }

    fn perform(&mut self, effect: Effect) -> Event {
        match effect {
            Effect::FetchList => {
                let request = self.client.build_list_todos();
                match self
                    .send(request)
                    .and_then(|response| self.client.parse_list_todos(response))
                {
                    Ok(todos) => Event::Loaded(todos),
                    Err(err) => Event::LoadFailed(err.to_string()),
                }
            }
            Effect::Create(input) => {
                let result = self
                    .client
                    .build_create_todo(&input)
                    .and_then(|request| self.send(request))
                    .and_then(|response| self.client.parse_create_todo(response));
                match result {
                    Ok(todo) => Event::Added(todo),
                    Err(err) => failed(Action::Add, None, err),
                }
            }
            Effect::SetDone { id, done } => {
                let patch = UpdateTodo {
                    done: Some(done),
                    ..UpdateTodo::default()
                };
                match self.update(id, &patch) {
                    Ok(todo) => Event::Toggled(todo),
                    Err(err) => failed(Action::Toggle, Some(id), err),
                }
            }
            Effect::Rename { id, title } => {
                let patch = UpdateTodo {
                    title: Some(title),
                    ..UpdateTodo::default()
                };
                match self.update(id, &patch) {
                    Ok(todo) => Event::Renamed(todo),
                    Err(err) => failed(Action::Rename, Some(id), err),
                }
            }
            Effect::Delete(id) => {
                let request = self.client.build_delete_todo(id);
                match self
                    .send(request)
                    .and_then(|response| self.client.parse_delete_todo(response))
                {
                    Ok(()) => Event::Deleted(id),
                    Err(err) => failed(Action::Delete, Some(id), err),
                }
            }
        }
    }

    fn update(&mut self, id: uuid::Uuid, patch: &UpdateTodo) -> Result<crate::Todo, ApiError> {
        let request = self.client.build_update_todo(id, patch)?;
        let response = self.send(request)?;
        self.client.parse_update_todo(response)
    }
}

fn failed(action: Action, id: Option<uuid::Uuid>, err: ApiError) -> Event {
    tracing::warn!(?action, error = %err, "todo request failed");
    Event::Failed {
        action,
        id,
        message: err.to_string(),
    }
}

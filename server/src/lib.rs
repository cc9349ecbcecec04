//! Todo API service.
//!
//! # Overview
//! Serves a single collection of todos over HTTP/JSON under `/api`:
//! list (newest first, capped at 100), create, partial update, delete, and a
//! health probe. Input is validated before any store call; store faults are
//! reported as an opaque 500.
//!
//! # Design
//! - Handlers depend on the [`TodoStore`] trait, never on a concrete backend.
//! - Time comes from an injected [`Clock`]; `timeAgo` is rendered per response.
//! - [`run`] is shared by the binary and by integration tests.

pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod routes;
pub mod store;
pub mod validate;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, patch},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, CorsPolicy};
pub use error::{ApiError, ErrorBody};
pub use model::{Priority, TodoRecord, TodoView};
pub use routes::{AppState, Health, LIST_LIMIT};
pub use store::{open_store, MemoryStore, SqliteStore, StoreError, TodoStore};

use routes::{create_todo, delete_todo, health, list_todos, route_not_found, update_todo};

/// Largest accepted request body.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Router with an open CORS policy.
pub fn app(state: AppState) -> Router {
    router(state, &CorsPolicy::Any)
}

pub fn router(state: AppState, cors: &CorsPolicy) -> Router {
    Router::new()
        .route("/api/todos", get(list_todos).post(create_todo))
        .route("/api/todos/{id}", patch(update_todo).delete(delete_todo))
        .route("/api/health", get(health))
        .fallback(route_not_found)
        .method_not_allowed_fallback(route_not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(cors_layer(cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(policy: &CorsPolicy) -> CorsLayer {
    match policy {
        CorsPolicy::Any => CorsLayer::permissive(),
        CorsPolicy::Origin(origin) => CorsLayer::new()
            .allow_origin(origin.clone())
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE]),
    }
}

/// Serve `app` on `listener` until Ctrl-C or SIGTERM.
pub async fn run(listener: TcpListener, app: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received, draining connections");
}

//! Error responses for the todo API.
//!
//! # Design
//! Every failure leaves the service as `{error, code?, details?}`. Client
//! errors carry a stable `code` and a human `error` message. Store faults are
//! logged in full here and answered with an opaque 500 so that no internal
//! detail reaches the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;
use crate::validate::ValidationErrors;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("todo not found")]
    NotFound,

    #[error("route not found")]
    RouteNotFound,

    #[error(transparent)]
    Internal(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidId(_) | ApiError::MalformedBody(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        let simple = |error: &str, code: &str| ErrorBody {
            error: error.to_string(),
            code: Some(code.to_string()),
            details: None,
        };
        match self {
            ApiError::Validation(errors) => match errors.issues() {
                [single] => simple(single.message(), single.code()),
                issues => ErrorBody {
                    error: "Validation failed".to_string(),
                    code: Some("VALIDATION_FAILED".to_string()),
                    details: Some(issues.iter().map(|i| i.message().to_string()).collect()),
                },
            },
            ApiError::InvalidId(_) => simple("Invalid ID format", "INVALID_ID"),
            ApiError::MalformedBody(_) => simple("Invalid JSON body", "INVALID_JSON"),
            ApiError::PayloadTooLarge { .. } => simple("Request body too large", "PAYLOAD_TOO_LARGE"),
            ApiError::NotFound => simple("Todo not found", "NOT_FOUND"),
            ApiError::RouteNotFound => ErrorBody {
                error: "Route not found".to_string(),
                code: None,
                details: None,
            },
            ApiError::Internal(_) => simple("Internal server error", "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Internal(source) => tracing::error!(error = %source, "store failure"),
            other => tracing::debug!(error = %other, "request rejected"),
        }
        (self.status(), Json(self.body())).into_response()
    }
}

//! Error types for the todo API client.
//!
//! # Design
//! `NotFound` and `Validation` get dedicated variants because the view reacts
//! to them differently from generic failures. The server's
//! `{error, code?, details?}` body is decoded when present so the human
//! message reaches the user instead of raw JSON.

use serde::Deserialize;
use thiserror::Error;

/// Errors returned by `TodoClient` parse methods and by transports.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404: the todo does not exist.
    #[error("Todo not found")]
    NotFound,

    /// The server rejected the input (400).
    #[error("{message}")]
    Validation {
        message: String,
        code: Option<String>,
        details: Vec<String>,
    },

    /// Any other non-success status.
    #[error("HTTP {status}: {message}")]
    HttpError { status: u16, message: String },

    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The request never produced a response.
    #[error("network error: {0}")]
    Transport(String),
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub details: Vec<String>,
}

impl ApiError {
    /// Build the error for an unexpected status, decoding the server's error
    /// body when it has one.
    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        if status == 404 {
            return ApiError::NotFound;
        }
        let parsed = serde_json::from_str::<ErrorBody>(body).ok();
        match (status, parsed) {
            (400, Some(body)) => ApiError::Validation {
                message: body.error,
                code: body.code,
                details: body.details,
            },
            (400, None) => ApiError::Validation {
                message: body.to_string(),
                code: None,
                details: Vec::new(),
            },
            (status, Some(body)) => ApiError::HttpError {
                status,
                message: body.error,
            },
            (status, None) => ApiError::HttpError {
                status,
                message: body.to_string(),
            },
        }
    }

    /// Stable machine code sent by the server, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::NotFound => Some("NOT_FOUND"),
            ApiError::Validation { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

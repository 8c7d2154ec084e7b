//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its mapping
//! onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use validator::ValidationErrors;

use crate::config::ConfigError;
use notes_core::ports::PortError;

/// The JSON envelope returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    pub errors: Vec<String>,
}

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Malformed input, carrying per-field messages for the client.
    #[error("Validation failed")]
    Validation(Vec<String>),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect();
        messages.sort();
        ApiError::Validation(messages)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            ApiError::Port(PortError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg, vec![]),
            ApiError::Port(PortError::BadRequest(msg)) => (StatusCode::BAD_REQUEST, msg, vec![]),
            ApiError::Port(PortError::Unauthorized) => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized".to_string(),
                vec![],
            ),
            ApiError::Port(PortError::Embedding(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error generating embeddings".to_string(),
                vec![],
            ),
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "Validation failed".to_string(),
                errors,
            ),
            // Everything else is an internal failure; the details go to the
            // logs, never to the client.
            other => {
                tracing::error!("internal error: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".to_string(),
                    vec![],
                )
            }
        };

        let body = ErrorBody {
            success: false,
            message,
            errors,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let resp =
            ApiError::Port(PortError::NotFound("Note not found".to_string())).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unexpected_maps_to_500_with_a_safe_message() {
        let resp = ApiError::Port(PortError::Unexpected(
            "connection to 10.0.0.3:5432 refused".to_string(),
        ))
        .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_carries_field_messages() {
        let resp = ApiError::Validation(vec!["Email is invalid".to_string()]).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

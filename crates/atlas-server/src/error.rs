//! Server-wide error taxonomy
//!
//! Known variants pass through to the HTTP boundary unchanged; anything
//! unexpected is wrapped into `Internal` where it crosses the public
//! contract, and only a generic message is sent to the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::api::response::ErrorResponse;

/// Result type alias for handler and service operations
pub type AppResult<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// An external feed was unreachable, timed out, or returned a
    /// non-success payload. The whole refresh aborts.
    #[error("External data source unavailable: {detail}")]
    UpstreamUnavailable { detail: String },

    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed request input, rejected at the boundary.
    #[error("Validation failed for '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::UpstreamUnavailable { ref detail } => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse::with_details(
                    "UPSTREAM_UNAVAILABLE",
                    "External data source unavailable",
                    json!(detail),
                ),
            ),
            AppError::NotFound(ref message) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("NOT_FOUND", message.clone()),
            ),
            AppError::Validation {
                ref field,
                ref message,
            } => {
                let mut details = serde_json::Map::new();
                details.insert(field.clone(), json!(message));
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details(
                        "VALIDATION_ERROR",
                        "Validation failed",
                        serde_json::Value::Object(details),
                    ),
                )
            },
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("INTERNAL_ERROR", "A database error occurred"),
                )
            },
            AppError::Internal(ref message) => {
                tracing::error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred"),
                )
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<crate::db::StoreError> for AppError {
    fn from(err: crate::db::StoreError) -> Self {
        match err {
            crate::db::StoreError::Database(e) => AppError::Database(e),
        }
    }
}

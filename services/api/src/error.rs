//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how it is
//! turned into an HTTP response.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use palabra_core::{ports::PortError, upload::UploadError};
use tracing::error;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// The upload sequence failed at the blob write or the metadata insert.
    #[error("Upload Error: {0}")]
    Upload(#[from] UploadError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or missing request input, caught at the boundary.
    #[error("Bad request: {0}")]
    ClientInput(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::ClientInput(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            ApiError::Port(PortError::NotFound(_)) => StatusCode::NOT_FOUND.into_response(),
            ApiError::Port(PortError::InvalidInput(message)) => {
                (StatusCode::BAD_REQUEST, message).into_response()
            }
            other => {
                // Details stay in the log; the client only sees the status.
                error!("Request failed: {:?}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}

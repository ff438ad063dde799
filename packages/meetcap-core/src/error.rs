//! Centralized error types for the Meetcap core library.
//!
//! This module provides a unified error handling system that:
//! - Defines structured error types using `thiserror`
//! - Maps errors to appropriate HTTP status codes
//! - Implements `IntoResponse` for automatic JSON error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Trait for error types that provide machine-readable error codes.
///
/// Implement this trait to provide consistent error codes across different
/// error conversion paths.
pub trait ErrorCode {
    /// Returns a machine-readable error code for API responses.
    fn code(&self) -> &'static str;
}

/// Application-wide error type for the Meetcap ingestion server.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum IngestError {
    /// The frame envelope was too short or otherwise structurally invalid.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// A PCM container writer failed a write or header fix-up.
    #[error("writer I/O error: {0}")]
    WriterIo(String),

    /// The live directory could not be promoted to the completed archive.
    #[error("archive rename failed: {0}")]
    ArchiveRename(String),

    /// A transcription or summarisation provider call failed.
    #[error("provider failed: {0}")]
    ProviderFailure(String),

    /// Invalid or incomplete configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A session referenced by id does not exist in the registry.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Catch-all for unexpected failures that don't fit a narrower variant.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IngestError {
    /// Returns a machine-readable error code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedFrame(_) => "malformed_frame",
            Self::WriterIo(_) => "writer_io_error",
            Self::ArchiveRename(_) => "archive_rename_failed",
            Self::ProviderFailure(_) => "provider_failed",
            Self::Configuration(_) => "configuration_error",
            Self::SessionNotFound(_) => "session_not_found",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Maps the error to an appropriate HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedFrame(_) => StatusCode::BAD_REQUEST,
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ErrorCode for IngestError {
    fn code(&self) -> &'static str {
        IngestError::code(self)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Result Type Alias
// ─────────────────────────────────────────────────────────────────────────────

/// Convenient Result alias for application-wide operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// JSON response body for error responses.
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    status: u16,
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.code(),
            message: self.to_string(),
            status: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        Self::WriterIo(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_frame_returns_correct_code() {
        let err = IngestError::MalformedFrame("short frame".into());
        assert_eq!(err.code(), "malformed_frame");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn configuration_error_returns_correct_code() {
        let err = IngestError::Configuration("missing recordingsRoot".into());
        assert_eq!(err.code(), "configuration_error");
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn io_error_converts_to_writer_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err: IngestError = io_err.into();
        assert_eq!(err.code(), "writer_io_error");
    }
}

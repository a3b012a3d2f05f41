//! HTTP error responses.
//!
//! Every failure renders as the same JSON shape:
//!
//! ```json
//! { "error": "Failed to create primary for b.jpg: Decode failed: ...", "code": "decode_error" }
//! ```
//!
//! | `code` | Status | Cause |
//! |---|---|---|
//! | `intake_error` | 400 | malformed multipart, too many files, unreadable field |
//! | `decode_error` | 400 | an upload is not a decodable image |
//! | `encode_error` | 400 | resize, overlay or re-encode failed |
//! | `duplicate_filename` | 400 | two uploads map to the same output file |
//! | `storage_error` | 400 | writing to the storage directory failed |
//! | `internal_error` | 500 | worker join failure or a scheduler defect |
//!
//! A failed batch never carries a `files` key.

use crate::imaging::BackendError;
use crate::process::ProcessError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Intake(String),
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("{0}")]
    Internal(String),
}

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code for programmatic handling
    pub code: String,
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Intake(_) => "intake_error",
            ApiError::Internal(_) => "internal_error",
            ApiError::Process(err) => match err {
                ProcessError::Io(_) => "storage_error",
                ProcessError::DuplicateName(_) => "duplicate_filename",
                ProcessError::Transform { source, .. } => match source {
                    BackendError::Decode(_) => "decode_error",
                    BackendError::Encode(_) => "encode_error",
                    BackendError::Io(_) => "storage_error",
                },
                ProcessError::MissingPrimary { .. }
                | ProcessError::MissingThumbnail { .. }
                | ProcessError::UnexpectedResult { .. } => "internal_error",
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Internal(_)
            | ApiError::Process(
                ProcessError::MissingPrimary { .. }
                | ProcessError::MissingThumbnail { .. }
                | ProcessError::UnexpectedResult { .. },
            ) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Intake(_) | ApiError::Process(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Process(ProcessError::Io(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        if status.is_server_error() {
            tracing::error!(code, error = %self, "Request failed");
        } else {
            tracing::warn!(code, error = %self, "Request rejected");
        }
        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

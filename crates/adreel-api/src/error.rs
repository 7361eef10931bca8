//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record store error: {0}")]
    Sheets(adreel_sheets::SheetsError),

    #[error("Storage error: {0}")]
    Storage(#[from] adreel_storage::StorageError),

    #[error("Queue error: {0}")]
    Queue(#[from] adreel_queue::QueueError),

    #[error("Generation error: {0}")]
    Gen(#[from] adreel_gen::GenError),

    #[error("Media error: {0}")]
    Media(#[from] adreel_media::MediaError),

    #[error("Publish error: {0}")]
    Publish(#[from] adreel_publish::PublishError),
}

impl ApiError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_)
            | ApiError::Io(_)
            | ApiError::Sheets(_)
            | ApiError::Storage(_)
            | ApiError::Queue(_)
            | ApiError::Gen(_)
            | ApiError::Media(_)
            | ApiError::Publish(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<adreel_sheets::SheetsError> for ApiError {
    fn from(e: adreel_sheets::SheetsError) -> Self {
        // A missing record on a public endpoint is the caller's error,
        // not ours
        match e {
            adreel_sheets::SheetsError::RecordNotFound(id) => {
                ApiError::NotFound(format!("Preview record not found: {}", id))
            }
            other => ApiError::Sheets(other),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let error = if status == StatusCode::INTERNAL_SERVER_ERROR
            && std::env::var("ENVIRONMENT").unwrap_or_default() == "production"
        {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

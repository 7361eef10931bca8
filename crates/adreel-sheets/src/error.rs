//! Sheets error types.

use thiserror::Error;

/// Result type for record store operations.
pub type SheetsResult<T> = Result<T, SheetsError>;

/// Errors that can occur during record store operations.
#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Preview record not found: {0}")]
    RecordNotFound(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited, retry after {0}ms")]
    RateLimited(u64),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record error: {0}")]
    Record(#[from] adreel_models::RecordError),
}

impl SheetsError {
    pub fn auth_error(msg: impl Into<String>) -> Self {
        Self::AuthError(msg.into())
    }

    pub fn record_not_found(preview_id: impl Into<String>) -> Self {
        Self::RecordNotFound(preview_id.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SheetsError::Network(_) | SheetsError::RateLimited(_))
    }

    /// Retry-After hint when the server provided one.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            SheetsError::RateLimited(ms) => Some(*ms),
            _ => None,
        }
    }
}

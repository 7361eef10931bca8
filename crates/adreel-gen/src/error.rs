//! Generation error types.

use thiserror::Error;

pub type GenResult<T> = Result<T, GenError>;

#[derive(Debug, Error)]
pub enum GenError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Empty response: {0}")]
    EmptyResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Decode(#[from] base64::DecodeError),
}

impl GenError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn generation_failed(msg: impl Into<String>) -> Self {
        Self::GenerationFailed(msg.into())
    }

    pub fn empty_response(msg: impl Into<String>) -> Self {
        Self::EmptyResponse(msg.into())
    }
}

//! Dispatcher error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Render request failed: {0}")]
    RenderFailed(String),

    #[error("Queue error: {0}")]
    Queue(#[from] adreel_queue::QueueError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn render_failed(msg: impl Into<String>) -> Self {
        Self::RenderFailed(msg.into())
    }
}

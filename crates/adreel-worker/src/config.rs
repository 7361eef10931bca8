//! Dispatcher configuration.

use std::time::Duration;

use crate::error::{WorkerError, WorkerResult};

/// Dispatcher configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Base URL of the backend API
    pub backend_url: String,
    /// Shared secret for the internal render endpoint
    pub internal_token: String,
    /// Maximum renders dispatched concurrently
    pub max_concurrent_jobs: usize,
    /// How long a single render request may take end to end
    pub render_timeout: Duration,
    /// How often to scan for orphaned pending jobs
    pub claim_interval: Duration,
    /// Minimum idle time before a pending job can be claimed
    pub claim_min_idle: Duration,
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> WorkerResult<Self> {
        let backend_url = std::env::var("BACKEND_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string())
            .trim_end_matches('/')
            .to_string();

        let internal_token = std::env::var("INTERNAL_TOKEN")
            .map_err(|_| WorkerError::config_error("INTERNAL_TOKEN not set"))?;
        if internal_token.trim().is_empty() {
            return Err(WorkerError::config_error("INTERNAL_TOKEN is empty"));
        }

        Ok(Self {
            backend_url,
            internal_token,
            max_concurrent_jobs: std::env::var("WORKER_MAX_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            render_timeout: Duration::from_secs(
                std::env::var("WORKER_RENDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            claim_interval: Duration::from_secs(
                std::env::var("WORKER_CLAIM_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            claim_min_idle: Duration::from_secs(
                std::env::var("WORKER_CLAIM_MIN_IDLE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped() {
        let url = "https://api.example.com/".trim_end_matches('/').to_string();
        assert_eq!(url, "https://api.example.com");
    }

    #[test]
    fn defaults() {
        let config = WorkerConfig {
            backend_url: "http://localhost:8080".to_string(),
            internal_token: "secret".to_string(),
            max_concurrent_jobs: 2,
            render_timeout: Duration::from_secs(600),
            claim_interval: Duration::from_secs(30),
            claim_min_idle: Duration::from_secs(300),
        };
        assert_eq!(config.max_concurrent_jobs, 2);
        assert_eq!(config.render_timeout.as_secs(), 600);
    }
}

//! API configuration.

use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second
    pub rate_limit_rps: u32,
    /// Max request body size
    pub max_body_size: usize,
    /// Shared secret gating the internal render endpoint
    pub internal_token: String,
    /// QR destination used when a request omits `qrValue`
    pub default_qr_destination: String,
    /// How often the reconciliation sweeper scans the record store
    pub sweep_interval: Duration,
    /// Age after which a LEAD_CAPTURED record counts as stale
    pub sweep_stale_after: Duration,
    /// Environment (development/production)
    pub environment: String,
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let internal_token = std::env::var("INTERNAL_TOKEN")
            .map_err(|_| anyhow::anyhow!("INTERNAL_TOKEN must be set"))?;
        if internal_token.is_empty() {
            anyhow::bail!("INTERNAL_TOKEN cannot be empty");
        }

        Ok(Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            rate_limit_rps: std::env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024),
            internal_token,
            default_qr_destination: std::env::var("DEFAULT_QR_DESTINATION")
                .unwrap_or_else(|_| "https://adreel.example.com".to_string()),
            sweep_interval: Duration::from_secs(
                std::env::var("SWEEP_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            sweep_stale_after: Duration::from_secs(
                std::env::var("SWEEP_STALE_AFTER_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(900),
            ),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        })
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_flag_is_case_insensitive() {
        let config = ApiConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            max_body_size: 1024,
            internal_token: "secret".to_string(),
            default_qr_destination: "https://example.com".to_string(),
            sweep_interval: Duration::from_secs(300),
            sweep_stale_after: Duration::from_secs(900),
            environment: "Production".to_string(),
        };
        assert!(config.is_production());
    }
}

//! Token caching for Sheets authentication.
//!
//! Thread-safe, async-aware token cache with:
//! - Refresh margin to avoid token expiry during requests
//! - Single-flight pattern to prevent thundering herd on refresh
//! - Graceful fallback to an existing valid token on refresh failure

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use gcp_auth::TokenProvider;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{SheetsError, SheetsResult};

/// Refresh margin: refresh token 60 seconds before expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Conservative token TTL when expiry is unknown (50 minutes).
/// OAuth tokens are typically valid for 60 minutes.
const TOKEN_DEFAULT_TTL: Duration = Duration::from_secs(50 * 60);

/// OAuth scope for Sheets access.
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Cached token with expiration tracking.
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }

    fn is_usable(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Thread-safe token cache with single-flight refresh.
pub struct TokenCache {
    auth: Option<Arc<dyn TokenProvider>>,
    cache: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    /// Create a new token cache.
    pub fn new(auth: Arc<dyn TokenProvider>) -> Self {
        Self {
            auth: Some(auth),
            cache: RwLock::new(None),
        }
    }

    /// Create a cache preloaded with a fixed token and no provider.
    /// For tests against a local mock server.
    pub fn with_static_token(token: impl Into<String>) -> Self {
        Self {
            auth: None,
            cache: RwLock::new(Some(CachedToken {
                access_token: token.into(),
                expires_at: Instant::now() + TOKEN_DEFAULT_TTL,
            })),
        }
    }

    /// Invalidate the cached token.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }

    /// Get a valid access token, refreshing if necessary.
    pub async fn get_token(&self) -> SheetsResult<String> {
        // Fast path: check read lock first
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        // Slow path: acquire write lock and refresh
        let mut cache = self.cache.write().await;

        // Double-check: another task may have refreshed while we waited
        if let Some(cached) = cache.as_ref() {
            if cached.is_valid() {
                return Ok(cached.access_token.clone());
            }
        }

        self.refresh_token(&mut cache).await
    }

    async fn refresh_token(&self, cache: &mut Option<CachedToken>) -> SheetsResult<String> {
        let auth = self
            .auth
            .as_ref()
            .ok_or_else(|| SheetsError::auth_error("No token provider configured"))?;

        match auth.token(&[SHEETS_SCOPE]).await {
            Ok(token) => {
                let access_token = token.as_str().to_string();

                // Prefer the real expiry, fall back to a conservative default.
                let expires_at = {
                    let now = Utc::now();
                    let exp = token.expires_at();

                    if exp > now {
                        match (exp - now).to_std() {
                            Ok(ttl) => Instant::now() + ttl,
                            Err(_) => Instant::now() + TOKEN_DEFAULT_TTL,
                        }
                    } else {
                        Instant::now()
                    }
                };

                *cache = Some(CachedToken {
                    access_token: access_token.clone(),
                    expires_at,
                });

                debug!("Refreshed Sheets auth token");
                Ok(access_token)
            }
            Err(e) => {
                // On refresh failure, check if the existing token is still usable
                if let Some(cached) = cache.as_ref() {
                    if cached.is_usable() {
                        warn!("Token refresh failed, using existing token: {}", e);
                        return Ok(cached.access_token.clone());
                    }
                }

                Err(SheetsError::auth_error(format!(
                    "Failed to obtain auth token: {}",
                    e
                )))
            }
        }
    }
}

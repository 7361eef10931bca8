//! YouTube Data API client.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use adreel_models::PublishMetadata;

use crate::error::{PublishError, PublishResult};

/// People & Blogs.
const CATEGORY_ID: &str = "22";

/// Refresh margin before access token expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// YouTube client configuration.
#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// OAuth token endpoint (overridable for tests)
    pub token_url: String,
    /// Video upload endpoint (overridable for tests)
    pub upload_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl YouTubeConfig {
    /// Create config from environment variables.
    pub fn from_env() -> PublishResult<Self> {
        let get = |name: &str| {
            std::env::var(name)
                .map_err(|_| PublishError::config_error(format!("{} not set", name)))
        };

        Ok(Self {
            client_id: get("YOUTUBE_CLIENT_ID")?,
            client_secret: get("YOUTUBE_CLIENT_SECRET")?,
            refresh_token: get("YOUTUBE_REFRESH_TOKEN")?,
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            upload_url: "https://www.googleapis.com/upload/youtube/v3/videos".to_string(),
            timeout: Duration::from_secs(300),
        })
    }
}

/// Identity of a published video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedVideo {
    pub video_id: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
struct VideoResource<'a> {
    snippet: Snippet<'a>,
    status: UploadStatus,
}

#[derive(Debug, Serialize)]
struct Snippet<'a> {
    title: &'a str,
    description: &'a str,
    tags: &'a [String],
    #[serde(rename = "categoryId")]
    category_id: &'static str,
}

#[derive(Debug, Serialize)]
struct UploadStatus {
    #[serde(rename = "privacyStatus")]
    privacy_status: &'static str,
    #[serde(rename = "selfDeclaredMadeForKids")]
    self_declared_made_for_kids: bool,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct InsertResponse {
    id: String,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// YouTube Data API client.
pub struct YouTubeClient {
    config: YouTubeConfig,
    http: Client,
    token: RwLock<Option<CachedToken>>,
}

impl YouTubeClient {
    /// Create a new YouTube client.
    pub fn new(config: YouTubeConfig) -> PublishResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("adreel-publish/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            config,
            http,
            token: RwLock::new(None),
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> PublishResult<Self> {
        Self::new(YouTubeConfig::from_env()?)
    }

    /// Exchange the refresh token for an access token, cached until
    /// shortly before expiry.
    async fn access_token(&self) -> PublishResult<String> {
        {
            let token = self.token.read().await;
            if let Some(cached) = token.as_ref() {
                if Instant::now() + TOKEN_REFRESH_MARGIN < cached.expires_at {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let mut token = self.token.write().await;
        if let Some(cached) = token.as_ref() {
            if Instant::now() + TOKEN_REFRESH_MARGIN < cached.expires_at {
                return Ok(cached.access_token.clone());
            }
        }

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", self.config.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::auth_error(format!(
                "Token refresh returned {}: {}",
                status, body
            )));
        }

        let parsed: TokenResponse = response.json().await?;
        let ttl = Duration::from_secs(parsed.expires_in.unwrap_or(3600));

        debug!("Refreshed YouTube access token");
        *token = Some(CachedToken {
            access_token: parsed.access_token.clone(),
            expires_at: Instant::now() + ttl,
        });

        Ok(parsed.access_token)
    }

    /// Upload a rendered commercial as an unlisted video.
    ///
    /// Uses the resumable upload protocol: an init request carries the
    /// snippet/status JSON and returns the session URL, then the video
    /// bytes go out in one PUT.
    pub async fn upload_video(
        &self,
        video: Vec<u8>,
        metadata: &PublishMetadata,
    ) -> PublishResult<PublishedVideo> {
        let token = self.access_token().await?;

        let resource = VideoResource {
            snippet: Snippet {
                title: &metadata.title,
                description: &metadata.description,
                tags: &metadata.tags,
                category_id: CATEGORY_ID,
            },
            status: UploadStatus {
                privacy_status: "unlisted",
                self_declared_made_for_kids: false,
            },
        };

        let init = self
            .http
            .post(&self.config.upload_url)
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(&token)
            .header("X-Upload-Content-Type", "video/mp4")
            .header("X-Upload-Content-Length", video.len().to_string())
            .json(&resource)
            .send()
            .await?;

        if !init.status().is_success() {
            let status = init.status();
            let body = init.text().await.unwrap_or_default();
            return Err(PublishError::upload_failed(format!(
                "Upload init returned {}: {}",
                status, body
            )));
        }

        let session_url = init
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| {
                PublishError::invalid_response("Upload init response missing Location header")
            })?;

        let video_len = video.len();
        let response = self
            .http
            .put(&session_url)
            .bearer_auth(&token)
            .header(reqwest::header::CONTENT_TYPE, "video/mp4")
            .body(video)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::upload_failed(format!(
                "Upload returned {}: {}",
                status, body
            )));
        }

        let inserted: InsertResponse = response.json().await?;
        let published = PublishedVideo {
            url: format!("https://www.youtube.com/watch?v={}", inserted.id),
            video_id: inserted.id,
        };

        info!(
            "Published video {} ({} bytes) as unlisted",
            published.video_id, video_len
        );
        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server_uri: &str) -> YouTubeClient {
        YouTubeClient::new(YouTubeConfig {
            client_id: "cid".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: "refresh".to_string(),
            token_url: format!("{}/token", server_uri),
            upload_url: format!("{}/upload/youtube/v3/videos", server_uri),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn metadata() -> PublishMetadata {
        PublishMetadata {
            title: "Tony's Pizza Commercial".to_string(),
            description: "Now on YouTube CTV".to_string(),
            tags: vec!["pizza".to_string()],
        }
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at-1",
                "expires_in": 3600,
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn upload_returns_video_identity() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("POST"))
            .and(path("/upload/youtube/v3/videos"))
            .and(body_partial_json(serde_json::json!({
                "snippet": { "categoryId": "22" },
                "status": { "privacyStatus": "unlisted", "selfDeclaredMadeForKids": false },
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Location", format!("{}/session/abc", server.uri()).as_str()),
            )
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/session/abc"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "id": "vid123" })),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let published = client
            .upload_video(vec![0u8; 64], &metadata())
            .await
            .unwrap();

        assert_eq!(published.video_id, "vid123");
        assert_eq!(published.url, "https://www.youtube.com/watch?v=vid123");
    }

    #[tokio::test]
    async fn missing_session_url_is_invalid_response() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("POST"))
            .and(path("/upload/youtube/v3/videos"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.upload_video(vec![0u8; 8], &metadata()).await.unwrap_err();
        assert!(matches!(err, PublishError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn failed_token_refresh_is_auth_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.upload_video(vec![0u8; 8], &metadata()).await.unwrap_err();
        assert!(matches!(err, PublishError::AuthError(_)));
    }

    #[tokio::test]
    async fn access_token_is_cached_across_uploads() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at-1",
                "expires_in": 3600,
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/upload/youtube/v3/videos"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Location", format!("{}/session/s", server.uri()).as_str()),
            )
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/session/s"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "v" })),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        client.upload_video(vec![1], &metadata()).await.unwrap();
        client.upload_video(vec![2], &metadata()).await.unwrap();
    }
}

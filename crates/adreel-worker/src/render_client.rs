//! HTTP client for the backend's internal render endpoint.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::error::{WorkerError, WorkerResult};

pub const INTERNAL_SECRET_HEADER: &str = "X-Internal-Secret";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderRequest<'a> {
    preview_id: &'a str,
}

/// Calls POST /internal/renderAndUpload on the backend.
#[derive(Clone)]
pub struct RenderClient {
    http: Client,
    endpoint: String,
    internal_token: String,
}

impl RenderClient {
    pub fn new(backend_url: &str, internal_token: &str, timeout: Duration) -> WorkerResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/internal/renderAndUpload", backend_url),
            internal_token: internal_token.to_string(),
        })
    }

    /// Trigger one render. A 2xx response means the backend has
    /// rendered and published (or had already done so).
    pub async fn trigger_render(&self, preview_id: &str) -> WorkerResult<()> {
        debug!("Dispatching render for {}", preview_id);
        let response = self
            .http
            .post(&self.endpoint)
            .header(INTERNAL_SECRET_HEADER, &self.internal_token)
            .json(&RenderRequest { preview_id })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(WorkerError::render_failed(format!(
            "backend returned {} for {}: {}",
            status, preview_id, body
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> RenderClient {
        RenderClient::new(&server.uri(), "secret", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn sends_secret_and_preview_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/internal/renderAndUpload"))
            .and(header("X-Internal-Secret", "secret"))
            .and(body_partial_json(serde_json::json!({"previewId": "pv-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "previewId": "pv-1",
                "status": "UPLOADED"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.trigger_render("pv-1").await.unwrap();
    }

    #[tokio::test]
    async fn non_success_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/internal/renderAndUpload"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({"error": "ffmpeg failed"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.trigger_render("pv-1").await.unwrap_err();
        assert!(matches!(err, WorkerError::RenderFailed(_)));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn forbidden_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/internal/renderAndUpload"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(client.trigger_render("pv-1").await.is_err());
    }
}

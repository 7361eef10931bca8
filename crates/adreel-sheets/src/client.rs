//! Sheets REST API client.
//!
//! The record store is a single spreadsheet tab with one row per
//! preview. Lookup is a full-range read plus a linear scan on the key
//! column; updates resolve named fields to cell ranges and apply them
//! in one `values:batchUpdate` call so a partial update can never be
//! half-written.

use std::sync::Arc;
use std::time::Duration;

use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use adreel_models::{PreviewRecord, RecordUpdate, ROW_RANGE};

use crate::error::{SheetsError, SheetsResult};
use crate::retry::{with_retry, RetryConfig};
use crate::token_cache::TokenCache;

/// Sheets client configuration.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    /// Spreadsheet identifier
    pub spreadsheet_id: String,
    /// Tab name holding the records
    pub sheet_name: String,
    /// API base URL (overridable for tests)
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
}

impl SheetsConfig {
    /// Create config from environment variables.
    pub fn from_env() -> SheetsResult<Self> {
        let spreadsheet_id = std::env::var("SHEET_ID")
            .map_err(|_| SheetsError::auth_error("SHEET_ID must be set to access the sheet"))?;

        if spreadsheet_id.is_empty() {
            return Err(SheetsError::auth_error("SHEET_ID cannot be empty"));
        }

        Ok(Self {
            spreadsheet_id,
            sheet_name: std::env::var("SHEET_NAME").unwrap_or_else(|_| "Sheet1".to_string()),
            base_url: "https://sheets.googleapis.com/v4/spreadsheets".to_string(),
            timeout: Duration::from_secs(30),
            retry: RetryConfig::from_env(),
        })
    }
}

/// A block of cell values in A1 notation.
#[derive(Debug, Serialize, Deserialize)]
struct ValueRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<String>,
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Sheets REST API client.
pub struct SheetsClient {
    http: Client,
    config: SheetsConfig,
    token_cache: Arc<TokenCache>,
}

impl Clone for SheetsClient {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            config: self.config.clone(),
            token_cache: Arc::clone(&self.token_cache),
        }
    }
}

impl SheetsClient {
    /// Create a new Sheets client.
    pub fn new(config: SheetsConfig) -> SheetsResult<Self> {
        let auth = Self::create_auth_provider()?;
        Self::with_token_cache(config, TokenCache::new(auth))
    }

    /// Create with an explicit token cache (used by tests).
    pub fn with_token_cache(config: SheetsConfig, token_cache: TokenCache) -> SheetsResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("adreel-sheets/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config,
            token_cache: Arc::new(token_cache),
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> SheetsResult<Self> {
        Self::new(SheetsConfig::from_env()?)
    }

    fn create_auth_provider() -> SheetsResult<Arc<dyn TokenProvider>> {
        let service_account = CustomServiceAccount::from_env().map_err(|e| {
            SheetsError::auth_error(format!("Failed to load service account: {}", e))
        })?;

        match service_account {
            Some(sa) => Ok(Arc::new(sa)),
            None => Err(SheetsError::auth_error(
                "GOOGLE_APPLICATION_CREDENTIALS not set. \
                 Set it to the path of your service account JSON file.",
            )),
        }
    }

    fn data_range(&self) -> String {
        format!("{}!{}", self.config.sheet_name, ROW_RANGE)
    }

    /// A1 cell reference for a record field.
    ///
    /// Only single-letter columns exist in the layout (A through U).
    fn cell_ref(&self, column_index: usize, row_number: usize) -> String {
        let letter = (b'A' + column_index as u8) as char;
        format!("{}!{}{}", self.config.sheet_name, letter, row_number)
    }

    async fn send_with_auth(
        &self,
        build: impl Fn(&str) -> reqwest::RequestBuilder,
    ) -> SheetsResult<reqwest::Response> {
        let token = self.token_cache.get_token().await?;
        let response = build(&token).send().await?;

        // One re-auth attempt on an expired token
        if response.status() == StatusCode::UNAUTHORIZED {
            self.token_cache.invalidate().await;
            let token = self.token_cache.get_token().await?;
            return Ok(build(&token).send().await?);
        }

        Ok(response)
    }

    async fn check_status(response: reqwest::Response) -> SheetsResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(|secs| secs * 1000)
                .unwrap_or(1000);
            return Err(SheetsError::RateLimited(retry_after));
        }

        let body = response.text().await.unwrap_or_default();
        Err(SheetsError::request_failed(format!(
            "Sheets API returned {}: {}",
            status, body
        )))
    }

    /// Append a new record as the last row.
    pub async fn append_record(&self, record: &PreviewRecord) -> SheetsResult<()> {
        let url = format!(
            "{}/{}/values/{}:append?valueInputOption=RAW",
            self.config.base_url,
            self.config.spreadsheet_id,
            self.data_range()
        );
        let body = json!({ "values": [record.to_row()] });

        with_retry(&self.config.retry, "append_record", || async {
            let response = self
                .send_with_auth(|token| self.http.post(&url).bearer_auth(token).json(&body))
                .await?;
            Self::check_status(response).await?;
            Ok(())
        })
        .await?;

        debug!("Appended record {}", record.preview_id);
        Ok(())
    }

    /// Read the full row set.
    async fn fetch_rows(&self) -> SheetsResult<Vec<Vec<String>>> {
        let url = format!(
            "{}/{}/values/{}",
            self.config.base_url,
            self.config.spreadsheet_id,
            self.data_range()
        );

        with_retry(&self.config.retry, "fetch_rows", || async {
            let response = self
                .send_with_auth(|token| self.http.get(&url).bearer_auth(token))
                .await?;
            let response = Self::check_status(response).await?;
            let range: ValueRange = response.json().await?;
            Ok(range.values)
        })
        .await
    }

    /// Locate a record's 1-based row number by preview ID.
    async fn find_row(&self, preview_id: &str) -> SheetsResult<(usize, Vec<String>)> {
        let rows = self.fetch_rows().await?;

        rows.into_iter()
            .enumerate()
            .find(|(_, row)| row.first().map(String::as_str) == Some(preview_id))
            .map(|(idx, row)| (idx + 1, row))
            .ok_or_else(|| SheetsError::record_not_found(preview_id))
    }

    /// Fetch the record for a preview ID.
    pub async fn get_record(&self, preview_id: &str) -> SheetsResult<PreviewRecord> {
        let (_, row) = self.find_row(preview_id).await?;
        Ok(PreviewRecord::from_row(&row)?)
    }

    /// Fetch every record (header row is skipped).
    pub async fn list_records(&self) -> SheetsResult<Vec<PreviewRecord>> {
        let rows = self.fetch_rows().await?;
        Ok(rows
            .iter()
            .filter_map(|row| PreviewRecord::from_row(row).ok())
            .collect())
    }

    /// Apply a named-field update to the record matching `preview_id`.
    ///
    /// All changed cells go out in a single `values:batchUpdate`
    /// request.
    pub async fn update_record(
        &self,
        preview_id: &str,
        update: &RecordUpdate,
    ) -> SheetsResult<()> {
        let (row_number, _) = self.find_row(preview_id).await?;

        let data: Vec<serde_json::Value> = update
            .to_indexed()?
            .into_iter()
            .map(|(col, value)| {
                json!({
                    "range": self.cell_ref(col, row_number),
                    "values": [[value]],
                })
            })
            .collect();

        let url = format!(
            "{}/{}/values:batchUpdate",
            self.config.base_url, self.config.spreadsheet_id
        );
        let body = json!({
            "valueInputOption": "RAW",
            "data": data,
        });

        with_retry(&self.config.retry, "update_record", || async {
            let response = self
                .send_with_auth(|token| self.http.post(&url).bearer_auth(token).json(&body))
                .await?;
            Self::check_status(response).await?;
            Ok(())
        })
        .await?;

        debug!(
            "Updated record {} ({} fields)",
            preview_id,
            update.fields().len()
        );
        Ok(())
    }

    /// Check connectivity by fetching spreadsheet metadata.
    pub async fn check_connectivity(&self) -> SheetsResult<()> {
        let url = format!(
            "{}/{}?fields=spreadsheetId",
            self.config.base_url, self.config.spreadsheet_id
        );

        let response = self
            .send_with_auth(|token| self.http.get(&url).bearer_auth(token))
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adreel_models::{PreviewId, PreviewStatus, QrType};
    use chrono::Utc;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: String) -> SheetsClient {
        let config = SheetsConfig {
            spreadsheet_id: "sheet-123".to_string(),
            sheet_name: "Sheet1".to_string(),
            base_url,
            timeout: Duration::from_secs(5),
            retry: RetryConfig {
                max_retries: 0,
                base_delay_ms: 1,
                max_delay_ms: 1,
            },
        };
        SheetsClient::with_token_cache(config, TokenCache::with_static_token("test-token")).unwrap()
    }

    fn test_record(preview_id: &str) -> PreviewRecord {
        PreviewRecord {
            preview_id: PreviewId::from(preview_id),
            created_at: Utc::now(),
            business_name: "Tony's Pizza".to_string(),
            business_type: "Italian Restaurant".to_string(),
            offer: "Buy 1 Get 1 Free".to_string(),
            extra_info: String::new(),
            qr_type: QrType::Url,
            qr_value: "https://tonyspizza.com".to_string(),
            script: "script".to_string(),
            headline: "headline".to_string(),
            voice_url: "v".to_string(),
            bg_url: "b".to_string(),
            qr_url: "q".to_string(),
            mp4_url: None,
            youtube_video_id: None,
            youtube_url: None,
            status: PreviewStatus::Previewed,
            error: None,
            lead_name: None,
            lead_email: None,
            lead_phone: None,
        }
    }

    #[tokio::test]
    async fn append_posts_one_row() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/sheet-123/values/Sheet1!A:U:append"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        client.append_record(&test_record("pv-1")).await.unwrap();
    }

    #[tokio::test]
    async fn get_record_scans_by_preview_id() {
        let server = MockServer::start().await;
        let wanted = test_record("pv-2");
        let other = test_record("pv-1");

        Mock::given(method("GET"))
            .and(path("/sheet-123/values/Sheet1!A:U"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "range": "Sheet1!A:U",
                "values": [
                    adreel_models::COLUMNS.to_vec(),
                    other.to_row(),
                    wanted.to_row(),
                ],
            })))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let record = client.get_record("pv-2").await.unwrap();
        assert_eq!(record.preview_id.as_str(), "pv-2");
        assert_eq!(record.business_name, "Tony's Pizza");
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/sheet-123/values/Sheet1!A:U"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "range": "Sheet1!A:U",
                "values": [adreel_models::COLUMNS.to_vec()],
            })))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let err = client.get_record("pv-missing").await.unwrap_err();
        assert!(matches!(err, SheetsError::RecordNotFound(_)));
    }

    #[tokio::test]
    async fn update_batches_all_fields_in_one_write() {
        let server = MockServer::start().await;
        let record = test_record("pv-3");

        Mock::given(method("GET"))
            .and(path("/sheet-123/values/Sheet1!A:U"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "range": "Sheet1!A:U",
                "values": [adreel_models::COLUMNS.to_vec(), record.to_row()],
            })))
            .mount(&server)
            .await;

        // Row 2 holds the record; status is column Q, error is column R.
        Mock::given(method("POST"))
            .and(path("/sheet-123/values:batchUpdate"))
            .and(body_partial_json(serde_json::json!({
                "valueInputOption": "RAW",
                "data": [
                    { "range": "Sheet1!Q2", "values": [["ERROR"]] },
                    { "range": "Sheet1!R2", "values": [["boom"]] },
                ],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        client
            .update_record("pv-3", &RecordUpdate::errored("boom"))
            .await
            .unwrap();
    }
}

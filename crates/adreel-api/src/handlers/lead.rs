//! Lead capture handler.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use adreel_models::{PreviewId, PreviewStatus, RecordUpdate, RenderJob};
use adreel_queue::QueueError;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Request body for POST /api/requestFile.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFileRequest {
    pub preview_id: Option<String>,
    pub lead_name: Option<String>,
    pub lead_email: Option<String>,
    pub lead_phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RequestFileResponse {
    pub ok: bool,
}

fn required(value: Option<String>, field: &str) -> ApiResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::bad_request(format!("Missing field: {}", field))),
    }
}

/// POST /api/requestFile
///
/// Records the lead's contact details on the preview record and
/// schedules the render. Rendering happens asynchronously; the caller
/// gets an acknowledgement, not the video.
///
/// Returns:
/// - 200: Lead recorded and render scheduled (or already scheduled)
/// - 400: Missing fields
/// - 404: Unknown preview ID
pub async fn request_file_handler(
    State(state): State<AppState>,
    Json(req): Json<RequestFileRequest>,
) -> ApiResult<Json<RequestFileResponse>> {
    let preview_id = required(req.preview_id, "previewId")?;
    let lead_name = required(req.lead_name, "leadName")?;
    let lead_email = required(req.lead_email, "leadEmail")?;
    let lead_phone = required(req.lead_phone, "leadPhone")?;

    info!("request_file preview_id={}", preview_id);

    let record = state.records.get_record(&preview_id).await?;

    // Once a render has landed (or failed) the row never moves back to
    // LEAD_CAPTURED, and a LEAD_CAPTURED row already has a render
    // scheduled. Repeat requests are acknowledged without touching the
    // row or the queue.
    if !record.status.can_transition_to(PreviewStatus::LeadCaptured) {
        info!(
            "Preview {} is already {}, ignoring repeat request",
            preview_id,
            record.status.as_str()
        );
        return Ok(Json(RequestFileResponse { ok: true }));
    }

    state
        .records
        .update_record(
            &preview_id,
            &RecordUpdate::lead_captured(lead_name, lead_email, lead_phone),
        )
        .await?;

    let job = RenderJob::new(PreviewId::from(preview_id.as_str()));
    match state.queue.enqueue(&job).await {
        Ok(id) => info!("Scheduled render job {} as {}", job.job_id, id),
        // A repeat request while a render is in flight is not an error
        Err(QueueError::Duplicate(key)) => {
            debug!("Render already scheduled for {} ({})", preview_id, key)
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Json(RequestFileResponse { ok: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;

    use adreel_models::{PreviewRecord, PreviewStatus, QrType};

    use crate::config::ApiConfig;
    use crate::pipeline::deps::{
        MockContentGen, MockJobSink, MockObjectStore, MockPublisher, MockRecordStore, MockRenderer,
    };

    fn test_config() -> ApiConfig {
        ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 100,
            max_body_size: 1024 * 1024,
            internal_token: "secret".to_string(),
            default_qr_destination: "https://adreel.example.com".to_string(),
            sweep_interval: Duration::from_secs(300),
            sweep_stale_after: Duration::from_secs(900),
            environment: "development".to_string(),
        }
    }

    fn previewed_record(preview_id: &str) -> PreviewRecord {
        PreviewRecord {
            preview_id: PreviewId::from(preview_id),
            created_at: Utc::now(),
            business_name: "Tony's Pizza".to_string(),
            business_type: "Italian Restaurant".to_string(),
            offer: "Buy 1 Get 1 Free".to_string(),
            extra_info: String::new(),
            qr_type: QrType::Url,
            qr_value: "https://tonyspizza.com".to_string(),
            script: "s".to_string(),
            headline: "h".to_string(),
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

    fn state_with(records: MockRecordStore, queue: MockJobSink) -> AppState {
        AppState {
            config: test_config(),
            records: Arc::new(records),
            blobs: Arc::new(MockObjectStore::new()),
            content: Arc::new(MockContentGen::new()),
            publisher: Arc::new(MockPublisher::new()),
            queue: Arc::new(queue),
            renderer: Arc::new(MockRenderer::new()),
        }
    }

    fn body(preview_id: &str) -> RequestFileRequest {
        RequestFileRequest {
            preview_id: Some(preview_id.to_string()),
            lead_name: Some("Tony".to_string()),
            lead_email: Some("tony@example.com".to_string()),
            lead_phone: Some("+15551234".to_string()),
        }
    }

    #[tokio::test]
    async fn captures_lead_and_enqueues_render() {
        let mut records = MockRecordStore::new();
        records
            .expect_get_record()
            .returning(|id| Ok(previewed_record(id)));
        records
            .expect_update_record()
            .withf(|id, update| {
                let fields = update.fields();
                id == "pv-1"
                    && fields
                        .iter()
                        .any(|(n, v)| *n == "status" && v == "LEAD_CAPTURED")
                    && fields.iter().any(|(n, v)| *n == "lead_email" && v == "tony@example.com")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let mut queue = MockJobSink::new();
        queue
            .expect_enqueue()
            .withf(|job| job.preview_id.as_str() == "pv-1")
            .times(1)
            .returning(|_| Ok("1-0".to_string()));

        let state = state_with(records, queue);
        let response = request_file_handler(State(state), Json(body("pv-1")))
            .await
            .unwrap();
        assert!(response.0.ok);
    }

    #[tokio::test]
    async fn duplicate_enqueue_still_succeeds() {
        let mut records = MockRecordStore::new();
        records
            .expect_get_record()
            .returning(|id| Ok(previewed_record(id)));
        records.expect_update_record().returning(|_, _| Ok(()));

        let mut queue = MockJobSink::new();
        queue
            .expect_enqueue()
            .returning(|job| Err(QueueError::Duplicate(job.idempotency_key())));

        let state = state_with(records, queue);
        let response = request_file_handler(State(state), Json(body("pv-1")))
            .await
            .unwrap();
        assert!(response.0.ok);
    }

    #[tokio::test]
    async fn uploaded_preview_is_not_regressed() {
        let mut records = MockRecordStore::new();
        records.expect_get_record().returning(|id| {
            let mut record = previewed_record(id);
            record.status = PreviewStatus::Uploaded;
            record.mp4_url = Some("https://cdn.example/renders/pv-1/commercial.mp4".to_string());
            record.youtube_video_id = Some("vid123".to_string());
            Ok(record)
        });
        // No update_record expectation and an unmocked queue: any
        // status write or enqueue panics the test
        let state = state_with(records, MockJobSink::new());
        let response = request_file_handler(State(state), Json(body("pv-1")))
            .await
            .unwrap();
        assert!(response.0.ok);
    }

    #[tokio::test]
    async fn repeat_request_while_render_pending_changes_nothing() {
        let mut records = MockRecordStore::new();
        records.expect_get_record().returning(|id| {
            let mut record = previewed_record(id);
            record.status = PreviewStatus::LeadCaptured;
            record.lead_email = Some("tony@example.com".to_string());
            Ok(record)
        });

        let state = state_with(records, MockJobSink::new());
        let response = request_file_handler(State(state), Json(body("pv-1")))
            .await
            .unwrap();
        assert!(response.0.ok);
    }

    #[tokio::test]
    async fn unknown_preview_is_404_and_not_enqueued() {
        let mut records = MockRecordStore::new();
        records
            .expect_get_record()
            .returning(|id| Err(adreel_sheets::SheetsError::record_not_found(id)));

        // Unmocked queue: any enqueue call panics
        let state = state_with(records, MockJobSink::new());
        let err = request_file_handler(State(state), Json(body("pv-x")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn missing_lead_fields_rejected() {
        let state = state_with(MockRecordStore::new(), MockJobSink::new());
        let mut req = body("pv-1");
        req.lead_email = None;
        let err = request_file_handler(State(state), Json(req)).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}

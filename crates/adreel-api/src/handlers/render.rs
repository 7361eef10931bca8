//! Internal render handler.
//!
//! Invoked by the dispatcher, not by browsers. Guarded by a shared
//! secret checked before anything else runs.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{ApiError, ApiResult};
use crate::pipeline::render::{record_failure, render_and_publish, RenderOutcome};
use crate::state::AppState;

pub const INTERNAL_SECRET_HEADER: &str = "x-internal-secret";

/// Request body for POST /internal/renderAndUpload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub preview_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResponse {
    pub preview_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
}

fn check_internal_secret(headers: &HeaderMap, expected: &str) -> ApiResult<()> {
    let provided = headers
        .get(INTERNAL_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    match provided {
        Some(token) if token == expected => Ok(()),
        _ => Err(ApiError::forbidden("Invalid internal secret")),
    }
}

/// POST /internal/renderAndUpload
///
/// Runs the render-and-publish pipeline for one preview. Failures are
/// written to the record as an ERROR status before the error response
/// goes out, so the sheet reflects what the dispatcher saw.
///
/// Returns:
/// - 200: Published (or already published on redelivery)
/// - 403: Missing or wrong X-Internal-Secret
/// - 404: Unknown preview ID
pub async fn render_and_upload_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RenderRequest>,
) -> ApiResult<Json<RenderResponse>> {
    check_internal_secret(&headers, &state.config.internal_token)?;

    info!("render_and_upload preview_id={}", req.preview_id);
    match render_and_publish(&state, &req.preview_id).await {
        Ok(RenderOutcome::Published(video)) => Ok(Json(RenderResponse {
            preview_id: req.preview_id,
            status: "UPLOADED".to_string(),
            youtube_url: Some(video.url),
        })),
        Ok(RenderOutcome::AlreadyPublished) => Ok(Json(RenderResponse {
            preview_id: req.preview_id,
            status: "UPLOADED".to_string(),
            youtube_url: None,
        })),
        Err(e) => {
            error!("Render failed for {}: {}", req.preview_id, e);
            // An unknown ID has no row to mark
            if !matches!(e, ApiError::NotFound(_)) {
                record_failure(&state, &req.preview_id, &e.to_string()).await;
            }
            Err(e)
        }
    }
}

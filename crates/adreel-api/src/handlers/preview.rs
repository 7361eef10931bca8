//! Preview generation handler.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use adreel_models::{BusinessBrief, QrType};

use crate::error::{ApiError, ApiResult};
use crate::pipeline::preview::{generate_preview, PreviewInput, PreviewResponse};
use crate::state::AppState;

/// Request body for POST /api/generatePreview.
///
/// Every field is optional at the wire level so that missing fields
/// produce a 400 with a useful message instead of a deserialization
/// error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePreviewRequest {
    pub business_name: Option<String>,
    pub business_type: Option<String>,
    pub offer: Option<String>,
    #[serde(default)]
    pub extra_info: Option<String>,
    pub qr_type: Option<String>,
    pub qr_value: Option<String>,
}

fn required(value: Option<String>, field: &str) -> ApiResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::bad_request(format!("Missing field: {}", field))),
    }
}

/// POST /api/generatePreview
///
/// Generates commercial content, background image, voiceover, and QR
/// code for a business brief, uploads the assets, and appends a
/// PREVIEWED record.
///
/// Returns:
/// - 200: Preview bundle with asset URLs
/// - 400: Missing or invalid fields
pub async fn generate_preview_handler(
    State(state): State<AppState>,
    Json(req): Json<GeneratePreviewRequest>,
) -> ApiResult<Json<PreviewResponse>> {
    let brief = BusinessBrief {
        business_name: required(req.business_name, "businessName")?,
        business_type: required(req.business_type, "businessType")?,
        offer: required(req.offer, "offer")?,
        extra_info: req.extra_info.unwrap_or_default(),
    };

    let qr_type: QrType = required(req.qr_type, "qrType")?
        .parse()
        .map_err(|e| ApiError::bad_request(format!("{}", e)))?;
    // Absent QR destination falls back to the configured landing page
    let qr_value = match req.qr_value {
        Some(v) if !v.trim().is_empty() => v,
        _ => state.config.default_qr_destination.clone(),
    };

    info!("generate_preview business={}", brief.business_name);
    let response = generate_preview(
        &state,
        PreviewInput {
            brief,
            qr_type,
            qr_value,
        },
    )
    .await?;

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank_and_missing() {
        assert!(required(None, "offer").is_err());
        assert!(required(Some("   ".to_string()), "offer").is_err());
        assert_eq!(required(Some("x".to_string()), "offer").unwrap(), "x");
    }

    #[test]
    fn request_accepts_partial_body() {
        let req: GeneratePreviewRequest =
            serde_json::from_str(r#"{"businessName": "Tony's Pizza"}"#).unwrap();
        assert_eq!(req.business_name.as_deref(), Some("Tony's Pizza"));
        assert!(req.offer.is_none());
        assert!(req.qr_value.is_none());
    }
}

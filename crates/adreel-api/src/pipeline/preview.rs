//! Preview assembly pipeline.
//!
//! Turns a business brief into a previewable bundle: generated script
//! and headline, background image, voiceover, QR code, three public
//! asset URLs, and one appended PREVIEWED record. Nothing durable is
//! written until every asset is generated and uploaded, so a failed
//! generation leaves no partial record behind.

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use adreel_models::{BusinessBrief, PreviewId, PreviewRecord, PreviewStatus, QrType};
use adreel_storage::keys;

use crate::error::ApiResult;
use crate::state::AppState;

/// Validated preview input.
#[derive(Debug, Clone)]
pub struct PreviewInput {
    pub brief: BusinessBrief,
    pub qr_type: QrType,
    pub qr_value: String,
}

/// Preview bundle returned to the caller.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub preview_id: PreviewId,
    pub script: String,
    pub visual_headline: String,
    pub audio_url: String,
    pub image_url: String,
    pub qr_url: String,
}

/// Run the preview pipeline.
pub async fn generate_preview(state: &AppState, input: PreviewInput) -> ApiResult<PreviewResponse> {
    let preview_id = PreviewId::new();
    info!("Generating preview {} for {}", preview_id, input.brief.business_name);

    let content = state
        .content
        .generate_commercial_content(&input.brief)
        .await?;

    // Image and voiceover depend only on the content, not each other
    let (bg, voice) = tokio::try_join!(
        state
            .content
            .generate_background_image(&content.headline, &input.brief.business_type),
        state.content.generate_voiceover(&content.script),
    )?;

    let qr = adreel_media::qr_png(&input.qr_value)?;

    let id = preview_id.as_str();
    let bg_key = keys::bg_key(id);
    let qr_key = keys::qr_key(id);
    let voice_key = keys::voice_key(id);
    let (bg_url, qr_url, voice_url) = tokio::try_join!(
        state.blobs.upload_bytes(bg, &bg_key, "image/png"),
        state.blobs.upload_bytes(qr, &qr_key, "image/png"),
        state
            .blobs
            .upload_bytes(voice, &voice_key, "application/octet-stream"),
    )?;

    let record = PreviewRecord {
        preview_id: preview_id.clone(),
        created_at: Utc::now(),
        business_name: input.brief.business_name,
        business_type: input.brief.business_type,
        offer: input.brief.offer,
        extra_info: input.brief.extra_info,
        qr_type: input.qr_type,
        qr_value: input.qr_value,
        script: content.script.clone(),
        headline: content.headline.clone(),
        voice_url: voice_url.clone(),
        bg_url: bg_url.clone(),
        qr_url: qr_url.clone(),
        mp4_url: None,
        youtube_video_id: None,
        youtube_url: None,
        status: PreviewStatus::Previewed,
        error: None,
        lead_name: None,
        lead_email: None,
        lead_phone: None,
    };

    state.records.append_record(&record).await?;

    info!("Preview {} assembled", preview_id);
    Ok(PreviewResponse {
        preview_id,
        script: content.script,
        visual_headline: content.headline,
        audio_url: voice_url,
        image_url: bg_url,
        qr_url,
    })
}

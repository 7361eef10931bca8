//! Render-and-publish pipeline.
//!
//! Consumes a LEAD_CAPTURED record: stages the preview assets locally,
//! composes the commercial with ffmpeg, uploads the MP4, publishes it
//! unlisted, and lands the terminal state in one record update. The
//! pipeline is idempotent with respect to redelivery: a record already
//! marked UPLOADED short-circuits before any work is repeated.

use tracing::{info, warn};

use adreel_media::{CommercialAssets, ComposeSpec};
use adreel_models::{PreviewStatus, RecordUpdate};
use adreel_publish::PublishedVideo;
use adreel_storage::keys;

use crate::error::ApiResult;
use crate::state::AppState;

/// Result of one render invocation.
#[derive(Debug)]
pub enum RenderOutcome {
    /// Rendered, uploaded, and recorded
    Published(PublishedVideo),
    /// Record was already terminal; nothing was done
    AlreadyPublished,
}

/// Run the render pipeline for one preview.
pub async fn render_and_publish(state: &AppState, preview_id: &str) -> ApiResult<RenderOutcome> {
    let record = state.records.get_record(preview_id).await?;

    if record.status == PreviewStatus::Uploaded {
        info!("Preview {} already published, skipping render", preview_id);
        return Ok(RenderOutcome::AlreadyPublished);
    }

    // Stage assets in storage scoped to this invocation
    let staging = tempfile::tempdir()?;
    let assets = CommercialAssets {
        voice_pcm: staging.path().join("voice.pcm"),
        background: staging.path().join("bg.png"),
        qr: staging.path().join("qr.png"),
    };

    let voice_key = keys::voice_key(preview_id);
    let bg_key = keys::bg_key(preview_id);
    let qr_key = keys::qr_key(preview_id);
    let (voice, bg, qr) = tokio::try_join!(
        state.blobs.download_bytes(&voice_key),
        state.blobs.download_bytes(&bg_key),
        state.blobs.download_bytes(&qr_key),
    )?;
    tokio::fs::write(&assets.voice_pcm, voice).await?;
    tokio::fs::write(&assets.background, bg).await?;
    tokio::fs::write(&assets.qr, qr).await?;

    let spec = ComposeSpec {
        headline: record.headline.clone(),
        business_name: record.business_name.clone(),
    };
    let output = staging.path().join("commercial.mp4");
    state.renderer.render(&assets, &spec, &output).await?;

    let video = tokio::fs::read(&output).await?;
    info!("Rendered {} ({} bytes)", preview_id, video.len());

    let mp4_url = state
        .blobs
        .upload_bytes(video.clone(), &keys::mp4_key(preview_id), "video/mp4")
        .await?;

    let metadata = state
        .content
        .generate_publish_metadata(&record.business_name, &record.offer)
        .await?;
    let published = state.publisher.upload_video(video, &metadata).await?;

    state
        .records
        .update_record(
            preview_id,
            &RecordUpdate::uploaded(&mp4_url, &published.video_id, &published.url),
        )
        .await?;

    info!(
        "Published preview {} as {} ({})",
        preview_id, published.video_id, published.url
    );
    Ok(RenderOutcome::Published(published))
}

/// Record a terminal failure on the row, best effort.
///
/// Called by the handler after the pipeline fails; a second failure
/// here must not mask the original error.
pub async fn record_failure(state: &AppState, preview_id: &str, message: &str) {
    let update = RecordUpdate::errored(message);
    if let Err(e) = state.records.update_record(preview_id, &update).await {
        warn!(
            "Failed to record render error for {}: {} (original error: {})",
            preview_id, e, message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;
    use mockall::predicate::eq;

    use adreel_models::{PreviewId, PreviewRecord, QrType};

    use crate::config::ApiConfig;
    use crate::error::ApiError;
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

    fn lead_captured_record(preview_id: &str) -> PreviewRecord {
        PreviewRecord {
            preview_id: PreviewId::from(preview_id),
            created_at: Utc::now(),
            business_name: "Tony's Pizza".to_string(),
            business_type: "Italian Restaurant".to_string(),
            offer: "Buy 1 Get 1 Free".to_string(),
            extra_info: String::new(),
            qr_type: QrType::Url,
            qr_value: "https://tonyspizza.com".to_string(),
            script: "Hot and fresh!".to_string(),
            headline: "Free Pizza".to_string(),
            voice_url: "v".to_string(),
            bg_url: "b".to_string(),
            qr_url: "q".to_string(),
            mp4_url: None,
            youtube_video_id: None,
            youtube_url: None,
            status: PreviewStatus::LeadCaptured,
            error: None,
            lead_name: Some("Tony".to_string()),
            lead_email: Some("tony@example.com".to_string()),
            lead_phone: Some("+1555".to_string()),
        }
    }

    struct StateBuilder {
        records: MockRecordStore,
        blobs: MockObjectStore,
        content: MockContentGen,
        publisher: MockPublisher,
        renderer: MockRenderer,
    }

    impl StateBuilder {
        fn new() -> Self {
            Self {
                records: MockRecordStore::new(),
                blobs: MockObjectStore::new(),
                content: MockContentGen::new(),
                publisher: MockPublisher::new(),
                renderer: MockRenderer::new(),
            }
        }

        fn build(self) -> AppState {
            AppState {
                config: test_config(),
                records: Arc::new(self.records),
                blobs: Arc::new(self.blobs),
                content: Arc::new(self.content),
                publisher: Arc::new(self.publisher),
                queue: Arc::new(MockJobSink::new()),
                renderer: Arc::new(self.renderer),
            }
        }
    }

    #[tokio::test]
    async fn full_pipeline_lands_single_uploaded_update() {
        let mut b = StateBuilder::new();

        b.records
            .expect_get_record()
            .with(eq("pv-1"))
            .returning(|id| Ok(lead_captured_record(id)));
        b.blobs
            .expect_download_bytes()
            .times(3)
            .returning(|_| Ok(vec![0u8; 16]));
        b.renderer.expect_render().times(1).returning(|_, _, output| {
            std::fs::write(output, b"mp4-bytes").unwrap();
            Ok(())
        });
        b.blobs
            .expect_upload_bytes()
            .withf(|data, key, content_type| {
                data == b"mp4-bytes"
                    && key == "renders/pv-1/commercial.mp4"
                    && content_type == "video/mp4"
            })
            .times(1)
            .returning(|_, _, _| Ok("https://cdn.example/renders/pv-1/commercial.mp4".to_string()));
        b.content
            .expect_generate_publish_metadata()
            .with(eq("Tony's Pizza"), eq("Buy 1 Get 1 Free"))
            .returning(|_, _| {
                Ok(adreel_models::PublishMetadata {
                    title: "t".to_string(),
                    description: "d".to_string(),
                    tags: vec![],
                })
            });
        b.publisher.expect_upload_video().times(1).returning(|_, _| {
            Ok(PublishedVideo {
                video_id: "vid123".to_string(),
                url: "https://www.youtube.com/watch?v=vid123".to_string(),
            })
        });
        b.records
            .expect_update_record()
            .withf(|id, update| {
                let fields = update.fields();
                id == "pv-1"
                    && fields.iter().any(|(n, v)| *n == "status" && v == "UPLOADED")
                    && fields.iter().any(|(n, v)| *n == "youtube_video_id" && v == "vid123")
                    && fields.iter().any(|(n, _)| *n == "mp4_url")
                    && fields.iter().any(|(n, _)| *n == "youtube_url")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let state = b.build();
        let outcome = render_and_publish(&state, "pv-1").await.unwrap();
        assert!(matches!(outcome, RenderOutcome::Published(v) if v.video_id == "vid123"));
    }

    #[tokio::test]
    async fn already_uploaded_record_short_circuits() {
        let mut b = StateBuilder::new();
        b.records.expect_get_record().returning(|id| {
            let mut record = lead_captured_record(id);
            record.status = PreviewStatus::Uploaded;
            record.youtube_video_id = Some("vid123".to_string());
            Ok(record)
        });
        // Everything else unmocked: any render/upload/publish call panics

        let state = b.build();
        let outcome = render_and_publish(&state, "pv-1").await.unwrap();
        assert!(matches!(outcome, RenderOutcome::AlreadyPublished));
    }

    #[tokio::test]
    async fn publish_failure_leaves_record_untouched() {
        let mut b = StateBuilder::new();

        b.records
            .expect_get_record()
            .returning(|id| Ok(lead_captured_record(id)));
        b.blobs
            .expect_download_bytes()
            .returning(|_| Ok(vec![0u8; 16]));
        b.renderer.expect_render().returning(|_, _, output| {
            std::fs::write(output, b"mp4").unwrap();
            Ok(())
        });
        b.blobs
            .expect_upload_bytes()
            .returning(|_, _, _| Ok("https://cdn.example/mp4".to_string()));
        b.content.expect_generate_publish_metadata().returning(|_, _| {
            Ok(adreel_models::PublishMetadata {
                title: "t".to_string(),
                description: "d".to_string(),
                tags: vec![],
            })
        });
        b.publisher
            .expect_upload_video()
            .returning(|_, _| Err(adreel_publish::PublishError::upload_failed("quota")));
        // No update_record expectation: the UPLOADED write must not happen

        let state = b.build();
        let err = render_and_publish(&state, "pv-1").await.unwrap_err();
        assert!(matches!(err, ApiError::Publish(_)));
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let mut b = StateBuilder::new();
        b.records
            .expect_get_record()
            .returning(|id| Err(adreel_sheets::SheetsError::record_not_found(id)));

        let state = b.build();
        let err = render_and_publish(&state, "pv-x").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}

//! Capability traits at the pipeline seams.
//!
//! The preview and render pipelines talk to the outside world only
//! through these traits; production wires in the real adapter clients
//! and tests substitute mocks.

use std::path::Path;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use adreel_gen::GenResult;
use adreel_media::{CommercialAssets, ComposeSpec, MediaResult};
use adreel_models::{
    BusinessBrief, CommercialContent, PreviewRecord, PublishMetadata, RecordUpdate, RenderJob,
};
use adreel_publish::{PublishResult, PublishedVideo};
use adreel_queue::QueueResult;
use adreel_sheets::SheetsResult;
use adreel_storage::StorageResult;

/// Durable preview records.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn append_record(&self, record: &PreviewRecord) -> SheetsResult<()>;
    async fn get_record(&self, preview_id: &str) -> SheetsResult<PreviewRecord>;
    async fn list_records(&self) -> SheetsResult<Vec<PreviewRecord>>;
    async fn update_record(&self, preview_id: &str, update: &RecordUpdate) -> SheetsResult<()>;
    async fn check_connectivity(&self) -> SheetsResult<()>;
}

/// Public blob storage.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload bytes and return the public URL.
    async fn upload_bytes(
        &self,
        data: Vec<u8>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<String>;
    async fn download_bytes(&self, key: &str) -> StorageResult<Vec<u8>>;
    async fn check_connectivity(&self) -> StorageResult<()>;
}

/// Generated commercial assets.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ContentGen: Send + Sync {
    async fn generate_commercial_content(
        &self,
        brief: &BusinessBrief,
    ) -> GenResult<CommercialContent>;
    async fn generate_background_image(
        &self,
        headline: &str,
        business_type: &str,
    ) -> GenResult<Vec<u8>>;
    async fn generate_voiceover(&self, script: &str) -> GenResult<Vec<u8>>;
    async fn generate_publish_metadata(
        &self,
        business_name: &str,
        offer: &str,
    ) -> GenResult<PublishMetadata>;
}

/// Final video publishing.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn upload_video(
        &self,
        video: Vec<u8>,
        metadata: &PublishMetadata,
    ) -> PublishResult<PublishedVideo>;
}

/// Render job scheduling.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait JobSink: Send + Sync {
    async fn enqueue(&self, job: &RenderJob) -> QueueResult<String>;
    async fn check_connectivity(&self) -> QueueResult<()>;
}

/// Commercial composition.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(
        &self,
        assets: &CommercialAssets,
        spec: &ComposeSpec,
        output: &Path,
    ) -> MediaResult<()>;
}

#[async_trait]
impl RecordStore for adreel_sheets::SheetsClient {
    async fn append_record(&self, record: &PreviewRecord) -> SheetsResult<()> {
        adreel_sheets::SheetsClient::append_record(self, record).await
    }

    async fn get_record(&self, preview_id: &str) -> SheetsResult<PreviewRecord> {
        adreel_sheets::SheetsClient::get_record(self, preview_id).await
    }

    async fn list_records(&self) -> SheetsResult<Vec<PreviewRecord>> {
        adreel_sheets::SheetsClient::list_records(self).await
    }

    async fn update_record(&self, preview_id: &str, update: &RecordUpdate) -> SheetsResult<()> {
        adreel_sheets::SheetsClient::update_record(self, preview_id, update).await
    }

    async fn check_connectivity(&self) -> SheetsResult<()> {
        adreel_sheets::SheetsClient::check_connectivity(self).await
    }
}

#[async_trait]
impl ObjectStore for adreel_storage::BlobStore {
    async fn upload_bytes(
        &self,
        data: Vec<u8>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<String> {
        adreel_storage::BlobStore::upload_bytes(self, data, key, content_type).await
    }

    async fn download_bytes(&self, key: &str) -> StorageResult<Vec<u8>> {
        adreel_storage::BlobStore::download_bytes(self, key).await
    }

    async fn check_connectivity(&self) -> StorageResult<()> {
        adreel_storage::BlobStore::check_connectivity(self).await
    }
}

#[async_trait]
impl ContentGen for adreel_gen::GeminiClient {
    async fn generate_commercial_content(
        &self,
        brief: &BusinessBrief,
    ) -> GenResult<CommercialContent> {
        adreel_gen::GeminiClient::generate_commercial_content(self, brief).await
    }

    async fn generate_background_image(
        &self,
        headline: &str,
        business_type: &str,
    ) -> GenResult<Vec<u8>> {
        adreel_gen::GeminiClient::generate_background_image(self, headline, business_type).await
    }

    async fn generate_voiceover(&self, script: &str) -> GenResult<Vec<u8>> {
        adreel_gen::GeminiClient::generate_voiceover(self, script).await
    }

    async fn generate_publish_metadata(
        &self,
        business_name: &str,
        offer: &str,
    ) -> GenResult<PublishMetadata> {
        adreel_gen::GeminiClient::generate_publish_metadata(self, business_name, offer).await
    }
}

#[async_trait]
impl Publisher for adreel_publish::YouTubeClient {
    async fn upload_video(
        &self,
        video: Vec<u8>,
        metadata: &PublishMetadata,
    ) -> PublishResult<PublishedVideo> {
        adreel_publish::YouTubeClient::upload_video(self, video, metadata).await
    }
}

#[async_trait]
impl JobSink for adreel_queue::JobQueue {
    async fn enqueue(&self, job: &RenderJob) -> QueueResult<String> {
        adreel_queue::JobQueue::enqueue(self, job).await
    }

    async fn check_connectivity(&self) -> QueueResult<()> {
        adreel_queue::JobQueue::check_connectivity(self).await
    }
}

/// Production renderer shelling out to ffmpeg.
pub struct FfmpegRenderer;

#[async_trait]
impl Renderer for FfmpegRenderer {
    async fn render(
        &self,
        assets: &CommercialAssets,
        spec: &ComposeSpec,
        output: &Path,
    ) -> MediaResult<()> {
        adreel_media::render_commercial(assets, spec, output).await
    }
}

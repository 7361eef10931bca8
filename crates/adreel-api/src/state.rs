//! Application state.

use std::sync::Arc;

use adreel_gen::GeminiClient;
use adreel_publish::YouTubeClient;
use adreel_queue::JobQueue;
use adreel_sheets::SheetsClient;
use adreel_storage::BlobStore;

use crate::config::ApiConfig;
use crate::pipeline::deps::{
    ContentGen, FfmpegRenderer, JobSink, ObjectStore, Publisher, RecordStore, Renderer,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub records: Arc<dyn RecordStore>,
    pub blobs: Arc<dyn ObjectStore>,
    pub content: Arc<dyn ContentGen>,
    pub publisher: Arc<dyn Publisher>,
    pub queue: Arc<dyn JobSink>,
    pub renderer: Arc<dyn Renderer>,
}

impl AppState {
    /// Create application state wired to the real adapters.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let records = SheetsClient::from_env()?;
        let blobs = BlobStore::from_env()?;
        let content = GeminiClient::from_env()?;
        let publisher = YouTubeClient::from_env()?;
        let queue = JobQueue::from_env()?;
        queue.init().await?;

        Ok(Self {
            config,
            records: Arc::new(records),
            blobs: Arc::new(blobs),
            content: Arc::new(content),
            publisher: Arc::new(publisher),
            queue: Arc::new(queue),
            renderer: Arc::new(FfmpegRenderer),
        })
    }
}

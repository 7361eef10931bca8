//! Render job carried by the queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::PreviewId;

/// Job instructing the backend to run the render-and-publish pipeline
/// for one preview.
///
/// Jobs are ephemeral: the durable state lives on the preview record,
/// and the job names only the `preview_id` to run against. Delivery
/// is at-least-once, so consumers must tolerate redelivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderJob {
    /// Unique job ID (for logging and retry bookkeeping)
    pub job_id: String,
    /// Preview record to render and publish
    pub preview_id: PreviewId,
    /// When the job was created
    pub created_at: DateTime<Utc>,
}

impl RenderJob {
    /// Create a new render job for a preview.
    pub fn new(preview_id: PreviewId) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            preview_id,
            created_at: Utc::now(),
        }
    }

    /// Idempotency key for queue-side deduplication.
    ///
    /// One render per preview: two enqueues for the same preview
    /// collapse while the dedup window is open.
    pub fn idempotency_key(&self) -> String {
        format!("render:{}", self.preview_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotency_key_depends_only_on_preview() {
        let a = RenderJob::new(PreviewId::from("pv-1"));
        let b = RenderJob::new(PreviewId::from("pv-1"));
        assert_ne!(a.job_id, b.job_id);
        assert_eq!(a.idempotency_key(), b.idempotency_key());
        assert_eq!(a.idempotency_key(), "render:pv-1");
    }

    #[test]
    fn serde_roundtrip() {
        let job = RenderJob::new(PreviewId::from("pv-2"));
        let json = serde_json::to_string(&job).unwrap();
        let decoded: RenderJob = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.preview_id, job.preview_id);
        assert_eq!(decoded.job_id, job.job_id);
    }
}

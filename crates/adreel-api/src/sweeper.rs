//! Reconciliation sweeper.
//!
//! The queue is at-least-once but not at-least-once across every
//! failure mode: a crash between the sheet update and the enqueue
//! leaves a LEAD_CAPTURED row with no job behind it. The sweeper
//! periodically re-enqueues renders for rows that have sat in
//! LEAD_CAPTURED past a staleness threshold. A render that is still
//! pending or in flight holds its dedup key, so that re-enqueue comes
//! back Duplicate and is skipped.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use adreel_models::{PreviewStatus, RenderJob};
use adreel_queue::QueueError;

use crate::pipeline::deps::{JobSink, RecordStore};

pub struct ReconciliationSweeper {
    records: Arc<dyn RecordStore>,
    queue: Arc<dyn JobSink>,
    interval: Duration,
    stale_after: Duration,
}

impl ReconciliationSweeper {
    pub fn new(
        records: Arc<dyn RecordStore>,
        queue: Arc<dyn JobSink>,
        interval: Duration,
        stale_after: Duration,
    ) -> Self {
        Self {
            records,
            queue,
            interval,
            stale_after,
        }
    }

    /// Run the sweep loop forever.
    pub async fn run(&self) {
        info!(
            "Reconciliation sweeper started (interval={}s, stale_after={}s)",
            self.interval.as_secs(),
            self.stale_after.as_secs()
        );
        loop {
            tokio::time::sleep(self.interval).await;
            if let Err(e) = self.sweep_once().await {
                warn!("Reconciliation sweep failed: {}", e);
            }
        }
    }

    /// One sweep pass. Returns the number of jobs re-enqueued.
    pub async fn sweep_once(&self) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        let records = self.records.list_records().await?;
        let now = Utc::now();
        let mut requeued = 0;

        for record in records {
            if record.status != PreviewStatus::LeadCaptured {
                continue;
            }
            // The row carries no lead-capture timestamp, so age is
            // measured from preview creation. stale_after must exceed
            // the worst-case preview-to-publish latency; a row swept
            // early is still caught by the dedup key below while its
            // render is pending.
            let age = now.signed_duration_since(record.created_at);
            if age.num_seconds() < self.stale_after.as_secs() as i64 {
                continue;
            }

            let job = RenderJob::new(record.preview_id.clone());
            match self.queue.enqueue(&job).await {
                Ok(id) => {
                    info!("Re-enqueued stale render for {} as {}", record.preview_id, id);
                    requeued += 1;
                }
                Err(QueueError::Duplicate(key)) => {
                    debug!("Render already pending for {} ({})", record.preview_id, key)
                }
                Err(e) => warn!("Failed to re-enqueue {}: {}", record.preview_id, e),
            }
        }

        Ok(requeued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration as ChronoDuration;

    use adreel_models::{PreviewId, PreviewRecord, QrType};

    use crate::pipeline::deps::{MockJobSink, MockRecordStore};

    fn record(preview_id: &str, status: PreviewStatus, age_secs: i64) -> PreviewRecord {
        PreviewRecord {
            preview_id: PreviewId::from(preview_id),
            created_at: Utc::now() - ChronoDuration::seconds(age_secs),
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
            status,
            error: None,
            lead_name: Some("Tony".to_string()),
            lead_email: Some("tony@example.com".to_string()),
            lead_phone: None,
        }
    }

    fn sweeper(records: MockRecordStore, queue: MockJobSink) -> ReconciliationSweeper {
        ReconciliationSweeper::new(
            Arc::new(records),
            Arc::new(queue),
            Duration::from_secs(300),
            Duration::from_secs(900),
        )
    }

    #[tokio::test]
    async fn requeues_only_stale_lead_captured_rows() {
        let mut records = MockRecordStore::new();
        records.expect_list_records().returning(|| {
            Ok(vec![
                record("pv-stale", PreviewStatus::LeadCaptured, 2000),
                record("pv-fresh", PreviewStatus::LeadCaptured, 60),
                record("pv-done", PreviewStatus::Uploaded, 5000),
                record("pv-preview", PreviewStatus::Previewed, 5000),
            ])
        });

        let mut queue = MockJobSink::new();
        queue
            .expect_enqueue()
            .withf(|job| job.preview_id.as_str() == "pv-stale")
            .times(1)
            .returning(|_| Ok("1-0".to_string()));

        let requeued = sweeper(records, queue).sweep_once().await.unwrap();
        assert_eq!(requeued, 1);
    }

    #[tokio::test]
    async fn duplicate_on_requeue_is_not_counted() {
        let mut records = MockRecordStore::new();
        records.expect_list_records().returning(|| {
            Ok(vec![record("pv-1", PreviewStatus::LeadCaptured, 2000)])
        });

        let mut queue = MockJobSink::new();
        queue
            .expect_enqueue()
            .returning(|job| Err(QueueError::Duplicate(job.idempotency_key())));

        let requeued = sweeper(records, queue).sweep_once().await.unwrap();
        assert_eq!(requeued, 0);
    }
}

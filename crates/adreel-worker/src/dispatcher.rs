//! Render job dispatcher.
//!
//! Consumes render jobs from the queue and drives each one through the
//! backend's internal render endpoint. Delivery is at-least-once: a
//! failed dispatch is retried up to the queue's retry budget and then
//! parked on the dead letter stream.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use adreel_models::RenderJob;
use adreel_queue::JobQueue;

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::render_client::RenderClient;

pub struct Dispatcher {
    config: WorkerConfig,
    queue: Arc<JobQueue>,
    client: RenderClient,
    job_semaphore: Arc<Semaphore>,
    shutdown: tokio::sync::watch::Sender<bool>,
    consumer_name: String,
}

impl Dispatcher {
    pub fn new(config: WorkerConfig, queue: JobQueue) -> WorkerResult<Self> {
        let client = RenderClient::new(
            &config.backend_url,
            &config.internal_token,
            config.render_timeout,
        )?;
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        let (shutdown, _) = tokio::sync::watch::channel(false);
        let consumer_name = format!("dispatcher-{}", Uuid::new_v4());

        Ok(Self {
            config,
            queue: Arc::new(queue),
            client,
            job_semaphore,
            shutdown,
            consumer_name,
        })
    }

    /// Start the dispatch loop.
    pub async fn run(&self) -> WorkerResult<()> {
        info!(
            "Starting dispatcher '{}' with {} max concurrent renders",
            self.consumer_name, self.config.max_concurrent_jobs
        );

        self.queue.init().await?;

        let mut shutdown_rx = self.shutdown.subscribe();

        // Periodically reclaim jobs abandoned by crashed dispatchers
        let queue_clone = Arc::clone(&self.queue);
        let consumer_name = self.consumer_name.clone();
        let client_clone = self.client.clone();
        let semaphore_clone = Arc::clone(&self.job_semaphore);
        let claim_interval = self.config.claim_interval;
        let claim_min_idle_ms = self.config.claim_min_idle.as_millis() as u64;
        let mut shutdown_rx_claim = self.shutdown.subscribe();

        let claim_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(claim_interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx_claim.changed() => {
                        if *shutdown_rx_claim.borrow() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        match queue_clone.claim_pending(&consumer_name, claim_min_idle_ms, 5).await {
                            Ok(jobs) if !jobs.is_empty() => {
                                info!("Claimed {} pending jobs", jobs.len());
                                for (message_id, job) in jobs {
                                    let queue = Arc::clone(&queue_clone);
                                    let client = client_clone.clone();
                                    let permit = match semaphore_clone.clone().acquire_owned().await {
                                        Ok(p) => p,
                                        Err(_) => break,
                                    };
                                    tokio::spawn(async move {
                                        let _permit = permit;
                                        Self::dispatch_job(client, queue, message_id, job).await;
                                    });
                                }
                            }
                            Ok(_) => {}
                            Err(e) => warn!("Failed to claim pending jobs: {}", e),
                        }
                    }
                }
            }
        });

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping dispatcher");
                        break;
                    }
                }
                result = self.consume_jobs() => {
                    if let Err(e) = result {
                        error!("Error consuming jobs: {}", e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }

        claim_task.abort();

        info!("Waiting for in-flight renders to complete...");
        let _ = tokio::time::timeout(Duration::from_secs(60), self.wait_for_jobs()).await;

        info!("Dispatcher stopped");
        Ok(())
    }

    async fn consume_jobs(&self) -> WorkerResult<()> {
        let available = self.job_semaphore.available_permits();
        if available == 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            return Ok(());
        }

        let jobs = self
            .queue
            .consume(&self.consumer_name, 1000, available.min(5))
            .await?;

        if jobs.is_empty() {
            return Ok(());
        }

        debug!("Consumed {} jobs from queue", jobs.len());

        for (message_id, job) in jobs {
            let queue = Arc::clone(&self.queue);
            let client = self.client.clone();
            let permit = match self.job_semaphore.clone().acquire_owned().await {
                Ok(p) => p,
                Err(_) => return Ok(()),
            };

            tokio::spawn(async move {
                let _permit = permit;
                Self::dispatch_job(client, queue, message_id, job).await;
            });
        }

        Ok(())
    }

    /// Dispatch a single job with retry and DLQ handling.
    async fn dispatch_job(
        client: RenderClient,
        queue: Arc<JobQueue>,
        message_id: String,
        job: RenderJob,
    ) {
        info!("Dispatching job {} for preview {}", job.job_id, job.preview_id);

        match client.trigger_render(job.preview_id.as_str()).await {
            Ok(()) => {
                info!("Job {} completed", job.job_id);
                if let Err(e) = queue.ack(&message_id).await {
                    error!("Failed to ack job {}: {}", job.job_id, e);
                }
                // Clear the dedup key so a later re-request can render again
                if let Err(e) = queue.clear_dedup(&job).await {
                    warn!("Failed to clear dedup key for job {}: {}", job.job_id, e);
                }
            }
            Err(e) => {
                error!("Job {} failed: {}", job.job_id, e);

                let retry_count = queue.increment_retry(&message_id).await.unwrap_or(u32::MAX);
                let max_retries = queue.max_retries();

                if retry_count >= max_retries {
                    warn!(
                        "Job {} exceeded max retries ({}), moving to DLQ",
                        job.job_id, max_retries
                    );
                    if let Err(dlq_err) = queue.dlq(&message_id, &job, &e.to_string()).await {
                        error!("Failed to move job {} to DLQ: {}", job.job_id, dlq_err);
                    }
                    if let Err(e) = queue.clear_dedup(&job).await {
                        warn!("Failed to clear dedup key for job {}: {}", job.job_id, e);
                    }
                } else {
                    info!(
                        "Job {} will be retried (attempt {}/{})",
                        job.job_id, retry_count, max_retries
                    );
                    // Redelivered after the visibility timeout
                }
            }
        }
    }

    async fn wait_for_jobs(&self) {
        loop {
            if self.job_semaphore.available_permits() == self.config.max_concurrent_jobs {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

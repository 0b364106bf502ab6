//! Queue consumer for thumbnail generation
//!
//! Pops job descriptors one at a time and drives the pipeline for each.
//! Queue errors are retried after a fixed pause; malformed jobs and failed
//! jobs are logged and dropped.

use super::processor::ThumbnailProcessor;
use super::queue::JobQueue;
use super::request::RequestValidator;
use super::storage::ObjectSource;
use crate::config::QueueConfig;
use crate::error::Result;
use crate::models::{JobDescriptor, MediaBuffer, SourceKind, ThumbnailResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Consumer loop timing
#[derive(Clone, Debug)]
pub struct ThumbnailConsumerConfig {
    /// Bounded wait for each pop
    pub pop_timeout: Duration,
    /// Pause after a queue error before popping again
    pub retry_interval: Duration,
}

impl Default for ThumbnailConsumerConfig {
    fn default() -> Self {
        Self {
            pop_timeout: Duration::from_secs(5),
            retry_interval: Duration::from_secs(1),
        }
    }
}

impl From<&QueueConfig> for ThumbnailConsumerConfig {
    fn from(config: &QueueConfig) -> Self {
        Self {
            pop_timeout: config.pop_timeout(),
            retry_interval: config.retry_interval(),
        }
    }
}

/// Counters reported when the loop stops
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerStats {
    pub received: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub malformed: u64,
    pub queue_errors: u64,
}

/// Sequential thumbnail job consumer
pub struct ThumbnailConsumer<Q> {
    queue: Q,
    source: Arc<dyn ObjectSource>,
    processor: ThumbnailProcessor,
    validator: RequestValidator,
    config: ThumbnailConsumerConfig,
    shutdown_rx: watch::Receiver<bool>,
    stats: ConsumerStats,
}

impl<Q: JobQueue> ThumbnailConsumer<Q> {
    pub fn new(
        queue: Q,
        source: Arc<dyn ObjectSource>,
        processor: ThumbnailProcessor,
        validator: RequestValidator,
        config: ThumbnailConsumerConfig,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            queue,
            source,
            processor,
            validator,
            config,
            shutdown_rx,
            stats: ConsumerStats::default(),
        }
    }

    /// Run until shutdown is signalled; the flag is checked before every pop.
    /// Returns the counters for the caller to report.
    pub async fn run(&mut self) -> ConsumerStats {
        info!(
            pop_timeout_secs = self.config.pop_timeout.as_secs(),
            retry_interval_ms = self.config.retry_interval.as_millis() as u64,
            "Starting thumbnail consumer loop"
        );

        loop {
            if *self.shutdown_rx.borrow() {
                info!("Shutdown signal received, stopping consumer");
                break;
            }

            match self.queue.pop(self.config.pop_timeout).await {
                Ok(Some(payload)) => self.handle_message(&payload).await,
                Ok(None) => continue,
                Err(e) => {
                    self.stats.queue_errors += 1;
                    error!(error = %e, "Failed to get job from queue");
                    tokio::time::sleep(self.config.retry_interval).await;
                }
            }
        }

        self.stats
    }

    async fn handle_message(&mut self, payload: &str) {
        self.stats.received += 1;

        let job = match JobDescriptor::from_json(payload) {
            Ok(job) => job,
            Err(e) => {
                // already removed from the queue, nothing to requeue
                self.stats.malformed += 1;
                warn!(error = %e, "Failed to parse job payload, skipping");
                return;
            }
        };

        info!(
            content_id = %job.content_id,
            object_name = %job.object_reference,
            mime_type = %job.mime_type,
            kind = job.source_kind.as_str(),
            "Processing thumbnail job"
        );

        match self.process_job(&job).await {
            Ok(result) => {
                self.stats.succeeded += 1;
                info!(
                    content_id = %job.content_id,
                    width = result.width,
                    height = result.height,
                    size_bytes = result.size_bytes,
                    "Thumbnail job completed successfully"
                );
            }
            Err(e) => {
                self.stats.failed += 1;
                error!(
                    content_id = %job.content_id,
                    object_name = %job.object_reference,
                    business = e.is_business(),
                    error = %e,
                    "Thumbnail job failed"
                );
            }
        }
    }

    /// Fetch the job's object and run the matching pipeline
    pub async fn process_job(&self, job: &JobDescriptor) -> Result<ThumbnailResult> {
        let data = self.source.fetch(&job.object_reference).await?;
        debug!(content_id = %job.content_id, size = data.len(), "Fetched job source");

        match job.source_kind {
            SourceKind::Video => self.validator.check_video_payload(data.len())?,
            SourceKind::Image | SourceKind::AudioCover => {
                self.validator.check_image_payload(data.len())?
            }
        }

        let request = self.validator.job_request(job.source_kind);
        self.processor
            .process(MediaBuffer::new(data, job.mime_type.clone()), &request)
            .await
    }
}

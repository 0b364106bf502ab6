//! Thumbnail Worker - Redis queue consumer for asynchronous thumbnail generation
//!
//! Pops `{contentId, objectName, mimeType, type}` jobs from the queue, fetches
//! the object from MinIO/S3 and runs the image or video pipeline on it.
//!
//! Environment variables:
//! - REDIS_HOST / REDIS_PORT / REDIS_PASSWORD: queue backend
//! - QUEUE_NAME: list to pop from (default: "thumbnail-generation")
//! - QUEUE_POP_TIMEOUT_SECS: bounded wait per pop (default: 5)
//! - QUEUE_RETRY_INTERVAL_MS: pause after a queue error (default: 1000)
//! - MINIO_ENDPOINT / MINIO_ACCESS_KEY / MINIO_SECRET_KEY / MINIO_USE_SSL / MINIO_BUCKET_NAME
//! - DEFAULT_THUMBNAIL_WIDTH / DEFAULT_THUMBNAIL_HEIGHT / DEFAULT_JPEG_QUALITY
//! - THUMB_BLUR_JOBS: blur queue thumbnails (default: true)
//! - FFMPEG_PATH / THUMB_TEMP_DIR: frame extraction

use std::sync::Arc;
use thumbnail_service::services::thumbnail::{
    FfmpegFrameExtractor, RedisJobQueue, RequestValidator, S3ObjectSource, ThumbnailConsumer,
    ThumbnailConsumerConfig, ThumbnailProcessor,
};
use thumbnail_service::Config;
use tokio::sync::watch;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    thumbnail_service::init_tracing("thumb_worker=info,thumbnail_service=info");

    info!("Starting Thumbnail Worker");

    let config = Config::from_env()?;
    info!(
        redis_host = %config.queue.redis_host,
        redis_port = config.queue.redis_port,
        queue = %config.queue.queue_name,
        bucket = %config.storage.bucket,
        "Configuration loaded"
    );

    // Unreachable queue at startup is fatal
    let queue = RedisJobQueue::connect(&config.queue.redis_url(), config.queue.queue_name.clone())
        .await
        .map_err(|e| format!("Failed to connect to Redis: {e}"))?;

    let source = Arc::new(S3ObjectSource::from_config(&config.storage).await);

    let frame_extractor = Arc::new(FfmpegFrameExtractor::new(
        config.thumbnail.ffmpeg_path.clone(),
        config.thumbnail.temp_dir.clone(),
    ));
    let processor = ThumbnailProcessor::new(frame_extractor, config.thumbnail.data_uri);
    let validator = RequestValidator::new(config.limits.clone(), config.thumbnail.clone());

    // Setup shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        thumbnail_service::shutdown_signal().await;
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let mut consumer = ThumbnailConsumer::new(
        queue,
        source,
        processor,
        validator,
        ThumbnailConsumerConfig::from(&config.queue),
        shutdown_rx,
    );

    let stats = consumer.run().await;

    info!(
        received = stats.received,
        succeeded = stats.succeeded,
        failed = stats.failed,
        malformed = stats.malformed,
        queue_errors = stats.queue_errors,
        "Thumbnail Worker stopped"
    );
    Ok(())
}

//! Consumer loop tests with in-memory queue and object store fakes.

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thumbnail_service::config::{LimitsConfig, ThumbnailDefaults};
use thumbnail_service::models::{JobDescriptor, SourceKind};
use thumbnail_service::services::thumbnail::{
    ConsumerStats, FrameExtractor, JobQueue, ObjectSource, RequestValidator, ThumbnailConsumer,
    ThumbnailConsumerConfig, ThumbnailProcessor,
};
use thumbnail_service::{AppError, Result};
use tokio::sync::watch;

enum Step {
    Message(String),
    Empty,
    Error,
}

/// Replays scripted pop results, then raises shutdown once drained
struct ScriptedQueue {
    steps: VecDeque<Step>,
    pops: Arc<Mutex<u32>>,
    shutdown_tx: watch::Sender<bool>,
}

#[async_trait]
impl JobQueue for ScriptedQueue {
    async fn pop(&mut self, _timeout: Duration) -> Result<Option<String>> {
        *self.pops.lock().unwrap() += 1;
        match self.steps.pop_front() {
            Some(Step::Message(raw)) => Ok(Some(raw)),
            Some(Step::Empty) => Ok(None),
            Some(Step::Error) => Err(AppError::Queue(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "connection refused",
            )))),
            None => {
                let _ = self.shutdown_tx.send(true);
                Ok(None)
            }
        }
    }
}

struct MemoryStore {
    objects: HashMap<String, Vec<u8>>,
}

#[async_trait]
impl ObjectSource for MemoryStore {
    async fn fetch(&self, object_name: &str) -> Result<Bytes> {
        self.objects
            .get(object_name)
            .map(|data| Bytes::from(data.clone()))
            .ok_or_else(|| AppError::Storage(format!("no such object: {object_name}")))
    }
}

struct FixedFrame(Vec<u8>);

#[async_trait]
impl FrameExtractor for FixedFrame {
    async fn extract_frame(&self, _: &[u8], _: &str, _: &str) -> Result<Vec<u8>> {
        Ok(self.0.clone())
    }
}

fn solid_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([5, 5, 250]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Jpeg(80))
        .unwrap();
    buf
}

fn job(content_id: &str, object: &str, kind: SourceKind) -> String {
    serde_json::to_string(&JobDescriptor {
        content_id: content_id.to_string(),
        object_reference: object.to_string(),
        mime_type: "image/jpeg".to_string(),
        source_kind: kind,
    })
    .unwrap()
}

fn consumer(
    steps: Vec<Step>,
    shutdown: Option<(watch::Sender<bool>, watch::Receiver<bool>)>,
) -> (ThumbnailConsumer<ScriptedQueue>, Arc<Mutex<u32>>) {
    let (shutdown_tx, shutdown_rx) = shutdown.unwrap_or_else(|| watch::channel(false));
    let pops = Arc::new(Mutex::new(0));

    let queue = ScriptedQueue {
        steps: steps.into(),
        pops: pops.clone(),
        shutdown_tx,
    };

    let mut objects = HashMap::new();
    objects.insert("uploads/photo.jpg".to_string(), solid_jpeg(100, 50));
    objects.insert("uploads/clip.mp4".to_string(), vec![0u8; 64]);
    objects.insert("uploads/broken.jpg".to_string(), b"not an image".to_vec());

    let processor = ThumbnailProcessor::new(Arc::new(FixedFrame(solid_jpeg(40, 40))), false);
    let validator = RequestValidator::new(LimitsConfig::default(), ThumbnailDefaults::default());
    let config = ThumbnailConsumerConfig {
        pop_timeout: Duration::from_millis(10),
        retry_interval: Duration::from_millis(5),
    };

    let consumer = ThumbnailConsumer::new(
        queue,
        Arc::new(MemoryStore { objects }),
        processor,
        validator,
        config,
        shutdown_rx,
    );
    (consumer, pops)
}

#[tokio::test]
async fn test_processes_jobs_and_survives_failures() {
    let steps = vec![
        Step::Message(job("c-1", "uploads/photo.jpg", SourceKind::Image)),
        Step::Empty,
        Step::Error,
        Step::Message("{not json".to_string()),
        Step::Message(job("c-2", "uploads/missing.jpg", SourceKind::Image)),
        Step::Message(job("c-3", "uploads/broken.jpg", SourceKind::AudioCover)),
        Step::Message(job("c-4", "uploads/clip.mp4", SourceKind::Video)),
    ];
    let (mut consumer, _) = consumer(steps, None);

    let stats = tokio::time::timeout(Duration::from_secs(10), consumer.run())
        .await
        .expect("consumer should stop once the script is drained");

    assert_eq!(
        stats,
        ConsumerStats {
            received: 5,
            succeeded: 2,
            failed: 2,
            malformed: 1,
            queue_errors: 1,
        }
    );
}

#[tokio::test]
async fn test_shutdown_checked_before_first_pop() {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    shutdown_tx.send(true).unwrap();

    let steps = vec![Step::Message(job("c-1", "uploads/photo.jpg", SourceKind::Image))];
    let (mut consumer, pops) = consumer(steps, Some((shutdown_tx, shutdown_rx)));

    let stats = consumer.run().await;
    assert_eq!(stats, ConsumerStats::default());
    assert_eq!(*pops.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_process_job_uses_job_defaults() {
    let (consumer, _) = consumer(Vec::new(), None);

    let descriptor = JobDescriptor {
        content_id: "c-9".to_string(),
        object_reference: "uploads/photo.jpg".to_string(),
        mime_type: "image/jpeg".to_string(),
        source_kind: SourceKind::Image,
    };
    let result = consumer.process_job(&descriptor).await.unwrap();

    // default width 20, height derived from the 2:1 original
    assert_eq!((result.width, result.height), (20, 10));
    assert_eq!(result.mime_type, "image/jpeg");
}

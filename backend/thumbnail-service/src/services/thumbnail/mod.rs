//! Thumbnail generation service
//!
//! This module provides thumbnail generation capabilities:
//! - Format sniffing, size planning, pixel transforms and JPEG/base64 encoding
//! - Frame extraction from video via ffmpeg
//! - Request validation shared by the gRPC and queue entry points
//! - Redis queue consumer with object storage retrieval

pub mod consumer;
pub mod encoder;
pub mod format;
pub mod frame;
pub mod pixels;
pub mod processor;
pub mod queue;
pub mod request;
pub mod sizing;
pub mod storage;

pub use consumer::{ConsumerStats, ThumbnailConsumer, ThumbnailConsumerConfig};
pub use frame::{FfmpegFrameExtractor, FrameExtractor};
pub use processor::ThumbnailProcessor;
pub use queue::{JobQueue, RedisJobQueue};
pub use request::RequestValidator;
pub use storage::{ObjectSource, S3ObjectSource};

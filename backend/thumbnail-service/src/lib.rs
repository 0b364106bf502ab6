//! Thumbnail Service
//!
//! Generates small blurred JPEG previews from images and video frames, either
//! on demand over gRPC or from jobs on a Redis work queue.

pub mod config;
pub mod error;
pub mod grpc;
pub mod lifecycle;
pub mod models;
pub mod services;

// Public re-exports
pub use config::Config;
pub use error::{AppError, Result};
pub use lifecycle::{init_tracing, shutdown_signal};

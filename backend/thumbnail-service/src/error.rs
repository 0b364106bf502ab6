/// Error types for Thumbnail Service
///
/// Business failures (bad input, undecodable media, ffmpeg failures) are
/// turned into structured responses or log lines by the callers. Everything
/// else is infrastructure and maps onto a gRPC status.
use thiserror::Error;
use tonic::Status;

/// Result type for thumbnail-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Request rejected before the pipeline ran
    #[error("{0}")]
    Validation(String),

    /// Source media could not be decoded
    #[error("failed to decode {format} image: {message}")]
    Decode { format: String, message: String },

    /// Thumbnail could not be encoded
    #[error("failed to encode thumbnail: {0}")]
    Encode(String),

    /// External frame extraction tool failed
    #[error("failed to extract frame: {message}, output: {output}")]
    FrameExtraction { message: String, output: String },

    /// Queue backend unreachable or returned garbage
    #[error("Queue error: {0}")]
    Queue(#[from] redis::RedisError),

    /// Object storage retrieval failed
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for request-scoped failures that are reported as data rather
    /// than as transport faults.
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::Decode { .. }
                | AppError::Encode(_)
                | AppError::FrameExtraction { .. }
        )
    }
}

impl From<AppError> for Status {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Validation(msg) => Status::invalid_argument(msg),
            AppError::Decode { .. } | AppError::Encode(_) | AppError::FrameExtraction { .. } => {
                Status::failed_precondition(err.to_string())
            }
            AppError::Queue(_) | AppError::Storage(_) => Status::unavailable(err.to_string()),
            _ => Status::internal(err.to_string()),
        }
    }
}

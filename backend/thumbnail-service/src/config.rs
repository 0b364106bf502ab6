/// Configuration management for thumbnail-service
///
/// Loads configuration from environment variables with sensible defaults.
/// Values that fail to parse fall back to their default.
use crate::error::{AppError, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const MIB: u64 = 1024 * 1024;

/// Room for protobuf framing and the non-payload request fields
const MESSAGE_OVERHEAD: u64 = MIB;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub grpc: GrpcConfig,
    pub queue: QueueConfig,
    pub storage: StorageConfig,
    pub limits: LimitsConfig,
    pub thumbnail: ThumbnailDefaults,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GrpcConfig {
    pub host: String,
    pub port: u16,
    pub max_message_size: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct QueueConfig {
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_password: Option<String>,
    pub queue_name: String,
    pub pop_timeout_secs: u64,
    pub retry_interval_ms: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub use_ssl: bool,
    pub bucket: String,
    pub region: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LimitsConfig {
    pub max_concurrent_jobs: usize,
    pub max_image_size: u64,
    pub max_video_size: u64,
}

/// Defaults substituted into requests that leave parameters unset
#[derive(Clone, Debug, Deserialize)]
pub struct ThumbnailDefaults {
    pub width: i32,
    /// 0 means derive from the aspect ratio
    pub height: i32,
    pub quality: u8,
    pub video_timestamp: String,
    /// Blur queue-driven thumbnails (RPC callers choose per request)
    pub blur_jobs: bool,
    /// Prefix payloads with `data:image/jpeg;base64,`
    pub data_uri: bool,
    pub ffmpeg_path: String,
    pub temp_dir: PathBuf,
}

impl Default for ThumbnailDefaults {
    fn default() -> Self {
        Self {
            width: 20,
            height: 0,
            quality: 40,
            video_timestamp: "00:00:01.000".to_string(),
            blur_jobs: true,
            data_uri: false,
            ffmpeg_path: "ffmpeg".to_string(),
            temp_dir: std::env::temp_dir(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 10,
            max_image_size: 50 * MIB,
            max_video_size: 500 * MIB,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let thumbnail = ThumbnailDefaults {
            width: env_parse("DEFAULT_THUMBNAIL_WIDTH", 20),
            height: env_parse("DEFAULT_THUMBNAIL_HEIGHT", 0),
            quality: env_parse("DEFAULT_JPEG_QUALITY", 40),
            video_timestamp: env_or("DEFAULT_VIDEO_TIMESTAMP", "00:00:01.000"),
            blur_jobs: env_bool("THUMB_BLUR_JOBS", true),
            data_uri: env_bool("THUMB_DATA_URI", false),
            ffmpeg_path: env_or("FFMPEG_PATH", "ffmpeg"),
            temp_dir: std::env::var("THUMB_TEMP_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
        };

        if !(1..=100).contains(&thumbnail.quality) {
            return Err(AppError::Config(format!(
                "DEFAULT_JPEG_QUALITY must be within 1..=100, got {}",
                thumbnail.quality
            )));
        }

        let limits = LimitsConfig {
            max_concurrent_jobs: env_parse("MAX_CONCURRENT_JOBS", 10),
            max_image_size: env_parse("MAX_IMAGE_SIZE", 50 * MIB),
            max_video_size: env_parse("MAX_VIDEO_SIZE", 500 * MIB),
        };

        // Payloads up to the size limits must reach the handlers, which
        // report oversize requests themselves
        let largest_request = limits
            .max_image_size
            .max(limits.max_video_size)
            .saturating_add(MESSAGE_OVERHEAD);
        let largest_request = usize::try_from(largest_request).unwrap_or(usize::MAX);
        let max_message_size = env_parse("GRPC_MAX_MESSAGE_SIZE", largest_request);
        if max_message_size < largest_request {
            return Err(AppError::Config(format!(
                "GRPC_MAX_MESSAGE_SIZE ({max_message_size}) must be at least {largest_request} \
                 to admit MAX_IMAGE_SIZE/MAX_VIDEO_SIZE payloads"
            )));
        }

        Ok(Config {
            grpc: GrpcConfig {
                host: env_or("GRPC_HOST", "0.0.0.0"),
                port: env_parse("GRPC_PORT", 50051),
                max_message_size,
            },
            queue: QueueConfig {
                redis_host: env_or("REDIS_HOST", "localhost"),
                redis_port: env_parse("REDIS_PORT", 6379),
                redis_password: std::env::var("REDIS_PASSWORD")
                    .ok()
                    .filter(|v| !v.is_empty()),
                queue_name: env_or("QUEUE_NAME", "thumbnail-generation"),
                pop_timeout_secs: env_parse("QUEUE_POP_TIMEOUT_SECS", 5),
                retry_interval_ms: env_parse("QUEUE_RETRY_INTERVAL_MS", 1000),
            },
            storage: StorageConfig {
                endpoint: env_or("MINIO_ENDPOINT", "localhost:9000"),
                access_key: env_or("MINIO_ACCESS_KEY", "minioadmin"),
                secret_key: env_or("MINIO_SECRET_KEY", "minioadmin"),
                use_ssl: env_bool("MINIO_USE_SSL", false),
                bucket: env_or("MINIO_BUCKET_NAME", "synapse"),
                region: env_or("MINIO_REGION", "us-east-1"),
            },
            limits,
            thumbnail,
        })
    }
}

impl GrpcConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl QueueConfig {
    pub fn redis_url(&self) -> String {
        match &self.redis_password {
            Some(password) => format!(
                "redis://:{}@{}:{}/0",
                password, self.redis_host, self.redis_port
            ),
            None => format!("redis://{}:{}/0", self.redis_host, self.redis_port),
        }
    }

    pub fn pop_timeout(&self) -> Duration {
        Duration::from_secs(self.pop_timeout_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

impl StorageConfig {
    /// Endpoint URL with scheme, as the S3 client expects it
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://") {
            return self.endpoint.clone();
        }
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}", scheme, self.endpoint)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: &[&str] = &[
        "GRPC_PORT",
        "REDIS_PASSWORD",
        "MINIO_ENDPOINT",
        "MINIO_USE_SSL",
        "MAX_IMAGE_SIZE",
        "MAX_VIDEO_SIZE",
        "GRPC_MAX_MESSAGE_SIZE",
        "DEFAULT_JPEG_QUALITY",
        "THUMB_DATA_URI",
        "QUEUE_RETRY_INTERVAL_MS",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_defaults() {
        clear_env();

        let config = Config::from_env().unwrap();
        assert_eq!(config.grpc.port, 50051);
        assert_eq!(config.limits.max_image_size, 50 * 1024 * 1024);
        assert_eq!(config.limits.max_video_size, 500 * 1024 * 1024);
        assert_eq!(config.grpc.max_message_size, 501 * 1024 * 1024);
        assert_eq!(config.thumbnail.width, 20);
        assert_eq!(config.thumbnail.height, 0);
        assert_eq!(config.thumbnail.quality, 40);
        assert!(!config.thumbnail.data_uri);
        assert_eq!(config.queue.queue_name, "thumbnail-generation");
        assert_eq!(config.queue.redis_url(), "redis://localhost:6379/0");
        assert_eq!(config.storage.endpoint_url(), "http://localhost:9000");
    }

    #[test]
    #[serial_test::serial]
    fn test_overrides_and_bad_values() {
        clear_env();
        std::env::set_var("GRPC_PORT", "not-a-port");
        std::env::set_var("REDIS_PASSWORD", "s3cret");
        std::env::set_var("MINIO_USE_SSL", "true");
        std::env::set_var("MAX_IMAGE_SIZE", "1024");
        std::env::set_var("THUMB_DATA_URI", "1");
        std::env::set_var("QUEUE_RETRY_INTERVAL_MS", "250");

        let config = Config::from_env().unwrap();
        assert_eq!(config.grpc.port, 50051);
        assert_eq!(config.queue.redis_url(), "redis://:s3cret@localhost:6379/0");
        assert_eq!(config.storage.endpoint_url(), "https://localhost:9000");
        assert_eq!(config.limits.max_image_size, 1024);
        assert!(config.thumbnail.data_uri);
        assert_eq!(config.queue.retry_interval(), Duration::from_millis(250));

        clear_env();
    }

    #[test]
    #[serial_test::serial]
    fn test_message_size_admits_largest_payload() {
        clear_env();
        std::env::set_var("MAX_VIDEO_SIZE", "2048");
        std::env::set_var("MAX_IMAGE_SIZE", "1024");

        let config = Config::from_env().unwrap();
        assert_eq!(config.grpc.max_message_size, 2048 + 1024 * 1024);

        std::env::set_var("GRPC_MAX_MESSAGE_SIZE", "1000");
        assert!(matches!(Config::from_env(), Err(AppError::Config(_))));

        clear_env();
        std::env::set_var("GRPC_MAX_MESSAGE_SIZE", &(100 * MIB).to_string());
        // 100 MiB cannot carry a 500 MiB video
        assert!(matches!(Config::from_env(), Err(AppError::Config(_))));

        clear_env();
    }

    #[test]
    #[serial_test::serial]
    fn test_rejects_out_of_range_default_quality() {
        clear_env();
        std::env::set_var("DEFAULT_JPEG_QUALITY", "0");

        assert!(matches!(Config::from_env(), Err(AppError::Config(_))));

        clear_env();
    }
}

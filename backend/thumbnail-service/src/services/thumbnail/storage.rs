//! Object storage client for queue jobs
//!
//! Jobs name an object rather than carrying bytes; this fetches it from an
//! S3-compatible store (MinIO in development).

use crate::config::StorageConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::{debug, info};

/// Read access to stored source media
#[async_trait]
pub trait ObjectSource: Send + Sync {
    async fn fetch(&self, object_name: &str) -> Result<Bytes>;
}

/// S3/MinIO-backed object source
#[derive(Clone, Debug)]
pub struct S3ObjectSource {
    client: Client,
    bucket: String,
}

impl S3ObjectSource {
    /// Build a client with static credentials and a custom endpoint
    pub async fn from_config(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None, // No session token
            None, // No expiration
            "thumbnail_service_storage",
        );

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(config.endpoint_url())
            .load()
            .await;

        // MinIO serves buckets by path, not by virtual host
        let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
            .force_path_style(true)
            .build();

        info!(
            endpoint = %config.endpoint_url(),
            bucket = %config.bucket,
            "Object storage client initialized"
        );

        Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        }
    }
}

#[async_trait]
impl ObjectSource for S3ObjectSource {
    async fn fetch(&self, object_name: &str) -> Result<Bytes> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(object_name)
            .send()
            .await
            .map_err(|e| {
                AppError::Storage(format!("Failed to fetch object {object_name}: {e}"))
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to read object {object_name}: {e}")))?
            .into_bytes();

        debug!(object = %object_name, size = data.len(), "Fetched source object");
        Ok(data)
    }
}

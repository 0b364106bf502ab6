//! Request validation and default substitution
//!
//! Shared by the gRPC handlers and the queue consumer so both entry points
//! resolve parameters the same way before invoking the pipeline.

use super::frame::validate_timestamp;
use crate::config::{LimitsConfig, ThumbnailDefaults};
use crate::error::{AppError, Result};
use crate::models::{SourceKind, ThumbnailRequest};

#[derive(Clone, Debug)]
pub struct RequestValidator {
    limits: LimitsConfig,
    defaults: ThumbnailDefaults,
}

impl RequestValidator {
    pub fn new(limits: LimitsConfig, defaults: ThumbnailDefaults) -> Self {
        Self { limits, defaults }
    }

    pub fn check_image_payload(&self, len: usize) -> Result<()> {
        check_payload("image", len, self.limits.max_image_size)
    }

    pub fn check_video_payload(&self, len: usize) -> Result<()> {
        check_payload("video", len, self.limits.max_video_size)
    }

    pub fn image_request(
        &self,
        width: i32,
        height: i32,
        quality: i32,
        blur: bool,
    ) -> ThumbnailRequest {
        ThumbnailRequest {
            target_width: self.width_or_default(width),
            target_height: self.height_or_default(height),
            quality: self.quality_or_default(quality),
            blur,
            source_kind: SourceKind::Image,
            timestamp: None,
        }
    }

    pub fn video_request(
        &self,
        width: i32,
        height: i32,
        quality: i32,
        blur: bool,
        timestamp: &str,
    ) -> Result<ThumbnailRequest> {
        let timestamp = if timestamp.trim().is_empty() {
            self.defaults.video_timestamp.clone()
        } else {
            timestamp.trim().to_string()
        };
        validate_timestamp(&timestamp)?;

        Ok(ThumbnailRequest {
            target_width: self.width_or_default(width),
            target_height: self.height_or_default(height),
            quality: self.quality_or_default(quality),
            blur,
            source_kind: SourceKind::Video,
            timestamp: Some(timestamp),
        })
    }

    /// Parameters for queue jobs, which carry no sizing of their own
    pub fn job_request(&self, source_kind: SourceKind) -> ThumbnailRequest {
        ThumbnailRequest {
            target_width: self.defaults.width,
            target_height: self.defaults.height,
            quality: self.defaults.quality,
            blur: self.defaults.blur_jobs,
            source_kind,
            timestamp: (source_kind == SourceKind::Video)
                .then(|| self.defaults.video_timestamp.clone()),
        }
    }

    fn width_or_default(&self, width: i32) -> i32 {
        if width <= 0 {
            self.defaults.width
        } else {
            width
        }
    }

    fn height_or_default(&self, height: i32) -> i32 {
        if height <= 0 {
            self.defaults.height
        } else {
            height
        }
    }

    fn quality_or_default(&self, quality: i32) -> u8 {
        if (1..=100).contains(&quality) {
            quality as u8
        } else {
            self.defaults.quality
        }
    }
}

fn check_payload(kind: &str, len: usize, max: u64) -> Result<()> {
    if len == 0 {
        return Err(AppError::Validation(format!("{kind} data is required")));
    }
    if len as u64 > max {
        return Err(AppError::Validation(format!(
            "{kind} size exceeds maximum allowed size of {max} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> RequestValidator {
        RequestValidator::new(
            LimitsConfig {
                max_concurrent_jobs: 1,
                max_image_size: 100,
                max_video_size: 1000,
            },
            ThumbnailDefaults::default(),
        )
    }

    #[test]
    fn test_payload_limits() {
        let v = validator();
        assert_eq!(
            v.check_image_payload(0).unwrap_err().to_string(),
            "image data is required"
        );
        assert!(v.check_image_payload(100).is_ok());
        assert_eq!(
            v.check_image_payload(101).unwrap_err().to_string(),
            "image size exceeds maximum allowed size of 100 bytes"
        );
        assert!(v.check_video_payload(1000).is_ok());
        assert!(v.check_video_payload(1001).is_err());
    }

    #[test]
    fn test_defaults_substituted() {
        let request = validator().image_request(0, -3, 0, false);
        assert_eq!(request.target_width, 20);
        assert_eq!(request.target_height, 0);
        assert_eq!(request.quality, 40);

        let request = validator().image_request(64, 48, 101, true);
        assert_eq!((request.target_width, request.target_height), (64, 48));
        assert_eq!(request.quality, 40);
        assert!(request.blur);

        assert_eq!(validator().image_request(0, 0, 100, false).quality, 100);
    }

    #[test]
    fn test_video_timestamp_default_and_validation() {
        let request = validator().video_request(0, 0, 0, true, "").unwrap();
        assert_eq!(request.timestamp.as_deref(), Some("00:00:01.000"));
        assert_eq!(request.source_kind, SourceKind::Video);

        assert!(validator().video_request(0, 0, 0, true, "-vf evil").is_err());
    }

    #[test]
    fn test_job_request() {
        let request = validator().job_request(SourceKind::AudioCover);
        assert!(request.blur);
        assert!(request.timestamp.is_none());

        let request = validator().job_request(SourceKind::Video);
        assert_eq!(request.timestamp.as_deref(), Some("00:00:01.000"));
    }
}

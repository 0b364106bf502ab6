//! Thumbnail processor - generates thumbnails from images and video frames
//!
//! Decodes the source, plans the target size, resizes and optionally blurs
//! at the pixel level, then encodes as JPEG + base64.
//!
//! Uses `spawn_blocking` for CPU-intensive operations to avoid blocking the async runtime.

use super::encoder::{encode_jpeg, encode_text};
use super::format::detect_format;
use super::frame::{FrameExtractor, DEFAULT_TIMESTAMP};
use super::pixels;
use super::sizing::plan_dimensions;
use crate::error::{AppError, Result};
use crate::models::{
    ImageDimensions, MediaBuffer, SourceKind, ThumbnailRequest, ThumbnailResult,
    THUMBNAIL_MIME_TYPE,
};
use image::GenericImageView;
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

/// Thumbnail processor
///
/// Holds no per-request state; every call works on its own buffers.
#[derive(Clone)]
pub struct ThumbnailProcessor {
    frame_extractor: Arc<dyn FrameExtractor>,
    data_uri: bool,
}

impl ThumbnailProcessor {
    pub fn new(frame_extractor: Arc<dyn FrameExtractor>, data_uri: bool) -> Self {
        Self {
            frame_extractor,
            data_uri,
        }
    }

    /// Dispatch on the request's source kind
    pub async fn process(
        &self,
        media: MediaBuffer,
        request: &ThumbnailRequest,
    ) -> Result<ThumbnailResult> {
        match request.source_kind {
            SourceKind::Video => self.process_video(media, request).await,
            SourceKind::Image | SourceKind::AudioCover => self.process_image(media, request).await,
        }
    }

    /// Generate a still thumbnail on the blocking thread pool
    pub async fn process_image(
        &self,
        media: MediaBuffer,
        request: &ThumbnailRequest,
    ) -> Result<ThumbnailResult> {
        let request = request.clone();
        let data_uri = self.data_uri;

        tokio::task::spawn_blocking(move || {
            generate_still(&media.data, &media.mime_type, &request, data_uri)
        })
        .await
        .map_err(|e| AppError::Internal(format!("Thumbnail task panicked: {e}")))?
    }

    /// Extract one frame and run it through the still pipeline
    pub async fn process_video(
        &self,
        media: MediaBuffer,
        request: &ThumbnailRequest,
    ) -> Result<ThumbnailResult> {
        let timestamp = request.timestamp.as_deref().unwrap_or(DEFAULT_TIMESTAMP);

        let frame = self
            .frame_extractor
            .extract_frame(&media.data, &media.mime_type, timestamp)
            .await?;

        debug!(
            frame_size = frame.len(),
            timestamp = %timestamp,
            "Extracted video frame"
        );

        let still = ThumbnailRequest {
            source_kind: SourceKind::Image,
            ..request.clone()
        };
        self.process_image(MediaBuffer::new(frame, THUMBNAIL_MIME_TYPE), &still)
            .await
    }

    /// Read image dimensions without producing a thumbnail
    pub async fn image_dimensions(&self, media: MediaBuffer) -> Result<ImageDimensions> {
        tokio::task::spawn_blocking(move || read_dimensions(&media.data, &media.mime_type))
            .await
            .map_err(|e| AppError::Internal(format!("Dimensions task panicked: {e}")))?
    }
}

/// Run the still pipeline synchronously.
///
/// **Note:** This performs CPU-intensive work and should not be called
/// directly from async code.
pub fn generate_still(
    data: &[u8],
    mime_type: &str,
    request: &ThumbnailRequest,
    data_uri: bool,
) -> Result<ThumbnailResult> {
    let format = detect_format(data, Some(mime_type));

    let img = image::load_from_memory(data).map_err(|e| AppError::Decode {
        format: format.to_string(),
        message: e.to_string(),
    })?;

    let (orig_w, orig_h) = img.dimensions();
    debug!(
        format = %format,
        original_width = orig_w,
        original_height = orig_h,
        "Processing image for thumbnail"
    );

    let target = plan_dimensions(orig_w, orig_h, request.target_width, request.target_height);
    if target.is_empty() {
        return Err(AppError::Encode(format!(
            "{orig_w}x{orig_h} image plans to an empty {}x{} thumbnail",
            target.width, target.height
        )));
    }
    let transformed = pixels::transform(img.to_rgba8(), target, request.blur);

    let jpeg = encode_jpeg(transformed, request.quality)?;
    let size_bytes = jpeg.len() as u64;

    debug!(
        width = target.width,
        height = target.height,
        size = size_bytes,
        "Thumbnail generated"
    );

    Ok(ThumbnailResult {
        encoded_payload: encode_text(&jpeg, data_uri),
        mime_type: THUMBNAIL_MIME_TYPE,
        width: target.width,
        height: target.height,
        size_bytes,
    })
}

fn read_dimensions(data: &[u8], mime_type: &str) -> Result<ImageDimensions> {
    let format = detect_format(data, Some(mime_type));
    let decode_error = |message: String| AppError::Decode {
        format: format.to_string(),
        message,
    };

    let (width, height) = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| decode_error(e.to_string()))?
        .into_dimensions()
        .map_err(|e| decode_error(e.to_string()))?;

    Ok(ImageDimensions {
        width,
        height,
        size_bytes: data.len() as u64,
    })
}

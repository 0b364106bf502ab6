/// Data models for thumbnail-service
///
/// This module defines structures for:
/// - Requests and results flowing through the thumbnail pipeline
/// - Job descriptors popped from the work queue
///
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const THUMBNAIL_MIME_TYPE: &str = "image/jpeg";

// ========================================
// Pipeline Models
// ========================================

/// Raw media bytes plus the MIME type declared by the caller
#[derive(Debug, Clone)]
pub struct MediaBuffer {
    pub data: Bytes,
    pub mime_type: String,
}

impl MediaBuffer {
    pub fn new(data: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// Still-image family sniffed from a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
    Bmp,
    Tiff,
    Unknown,
}

impl DetectedFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Gif => "GIF",
            Self::WebP => "WebP",
            Self::Bmp => "BMP",
            Self::Tiff => "TIFF",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for DetectedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// What kind of source a thumbnail is cut from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Image,
    Video,
    AudioCover,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::AudioCover => "audio-cover",
        }
    }
}

/// Fully resolved thumbnail parameters; defaults are already applied
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailRequest {
    /// 0 means derive from the aspect ratio
    pub target_width: i32,
    /// 0 means derive from the aspect ratio
    pub target_height: i32,
    pub quality: u8,
    pub blur: bool,
    pub source_kind: SourceKind,
    /// Only used for video sources (HH:MM:SS.mmm)
    pub timestamp: Option<String>,
}

/// Encoded thumbnail returned to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailResult {
    /// Base64 JPEG, optionally carrying a data URI prefix
    pub encoded_payload: String,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
    /// Size of the JPEG bytes before text encoding
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
    /// Size of the input buffer
    pub size_bytes: u64,
}

// ========================================
// Queue Models
// ========================================

/// Job popped from the thumbnail queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescriptor {
    pub content_id: String,
    #[serde(rename = "objectName")]
    pub object_reference: String,
    pub mime_type: String,
    #[serde(rename = "type")]
    pub source_kind: SourceKind,
}

impl JobDescriptor {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

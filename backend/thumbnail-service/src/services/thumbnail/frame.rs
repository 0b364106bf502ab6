//! Video frame extraction
//!
//! Pulls a single still frame out of a video by shelling out to ffmpeg. The
//! input video and the produced frame live in uniquely named temp files that
//! are removed on every exit path.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, warn};
use uuid::Uuid;

pub const DEFAULT_TIMESTAMP: &str = "00:00:01.000";

/// Capability to turn video bytes into one encoded frame
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Extract the frame at `timestamp` (HH:MM:SS.mmm) as image bytes
    async fn extract_frame(&self, video: &[u8], mime_type: &str, timestamp: &str)
        -> Result<Vec<u8>>;
}

/// ffmpeg-backed extractor
#[derive(Clone, Debug)]
pub struct FfmpegFrameExtractor {
    ffmpeg_path: String,
    temp_dir: PathBuf,
}

impl FfmpegFrameExtractor {
    pub fn new(ffmpeg_path: impl Into<String>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            temp_dir: temp_dir.into(),
        }
    }
}

impl Default for FfmpegFrameExtractor {
    fn default() -> Self {
        Self::new("ffmpeg", std::env::temp_dir())
    }
}

#[async_trait]
impl FrameExtractor for FfmpegFrameExtractor {
    async fn extract_frame(
        &self,
        video: &[u8],
        mime_type: &str,
        timestamp: &str,
    ) -> Result<Vec<u8>> {
        validate_timestamp(timestamp)?;

        let video_file = TempArtifact::new(&self.temp_dir, "video", video_extension(mime_type));
        let frame_file = TempArtifact::new(&self.temp_dir, "frame", "jpg");

        tokio::fs::write(video_file.path(), video)
            .await
            .map_err(|e| AppError::FrameExtraction {
                message: format!("failed to write video file: {e}"),
                output: String::new(),
            })?;

        debug!(
            video = %video_file.path().display(),
            frame = %frame_file.path().display(),
            timestamp = %timestamp,
            "Running ffmpeg frame extraction"
        );

        let output = Command::new(&self.ffmpeg_path)
            .arg("-i")
            .arg(video_file.path())
            .args(["-ss", timestamp, "-vframes", "1", "-y"])
            .arg(frame_file.path())
            .output()
            .await
            .map_err(|e| AppError::FrameExtraction {
                message: format!("failed to spawn {}: {e}", self.ffmpeg_path),
                output: String::new(),
            })?;

        if !output.status.success() {
            return Err(AppError::FrameExtraction {
                message: format!("ffmpeg failed: {}", output.status),
                output: combined_output(&output),
            });
        }

        // ffmpeg exits 0 without writing a frame when the timestamp is past the end
        let frame = tokio::fs::read(frame_file.path())
            .await
            .map_err(|e| AppError::FrameExtraction {
                message: format!("failed to read frame file: {e}"),
                output: combined_output(&output),
            })?;

        if frame.is_empty() {
            return Err(AppError::FrameExtraction {
                message: "ffmpeg produced an empty frame".to_string(),
                output: combined_output(&output),
            });
        }

        Ok(frame)
    }
}

/// Check `HH:MM:SS` with an optional `.mmm` fraction
pub fn validate_timestamp(timestamp: &str) -> Result<()> {
    let invalid = || {
        AppError::Validation(format!(
            "invalid timestamp {timestamp:?}, expected HH:MM:SS.mmm"
        ))
    };

    let (clock, fraction) = match timestamp.split_once('.') {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (timestamp, None),
    };

    if let Some(fraction) = fraction {
        if fraction.is_empty() || fraction.len() > 3 || !all_digits(fraction) {
            return Err(invalid());
        }
    }

    let parts: Vec<&str> = clock.split(':').collect();
    let [hours, minutes, seconds] = parts.as_slice() else {
        return Err(invalid());
    };

    if hours.is_empty() || !all_digits(hours) {
        return Err(invalid());
    }
    for field in [minutes, seconds] {
        if field.len() != 2 || !all_digits(field) || field.parse::<u8>().map_or(true, |v| v >= 60)
        {
            return Err(invalid());
        }
    }

    Ok(())
}

/// stdout followed by stderr
fn combined_output(output: &std::process::Output) -> String {
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}

fn all_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

fn video_extension(mime_type: &str) -> &'static str {
    match mime_type.trim().to_ascii_lowercase().as_str() {
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        "video/x-matroska" => "mkv",
        "video/x-msvideo" => "avi",
        "video/mpeg" => "mpeg",
        "video/3gpp" => "3gp",
        _ => "mp4",
    }
}

/// Temp file path removed when dropped
struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    fn new(dir: &Path, prefix: &str, extension: &str) -> Self {
        let name = format!("{prefix}_{}.{extension}", Uuid::new_v4().simple());
        Self {
            path: dir.join(name),
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove temp file"
            ),
        }
    }
}

//! Format sniffing for still images
//!
//! A recognized declared MIME type wins; otherwise the leading bytes are
//! matched against known magic numbers. The result only feeds diagnostics,
//! decoding is always attempted.

use crate::models::DetectedFormat;

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47];
const GIF_MAGIC: &[u8] = b"GIF8";
const RIFF_MAGIC: &[u8] = b"RIFF";
const WEBP_MARKER: &[u8] = b"WEBP";
const BMP_MAGIC: &[u8] = b"BM";
const TIFF_LE_MAGIC: &[u8] = &[0x49, 0x49, 0x2A, 0x00];
const TIFF_BE_MAGIC: &[u8] = &[0x4D, 0x4D, 0x00, 0x2A];

/// Classify a buffer, preferring the declared MIME type when it is known
pub fn detect_format(data: &[u8], declared_mime: Option<&str>) -> DetectedFormat {
    if let Some(format) = declared_mime.and_then(format_from_mime) {
        return format;
    }
    sniff(data)
}

fn format_from_mime(mime: &str) -> Option<DetectedFormat> {
    match mime.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some(DetectedFormat::Jpeg),
        "image/png" => Some(DetectedFormat::Png),
        "image/gif" => Some(DetectedFormat::Gif),
        "image/webp" => Some(DetectedFormat::WebP),
        "image/bmp" => Some(DetectedFormat::Bmp),
        "image/tiff" | "image/tif" => Some(DetectedFormat::Tiff),
        _ => None,
    }
}

fn sniff(data: &[u8]) -> DetectedFormat {
    if data.len() < 4 {
        return DetectedFormat::Unknown;
    }

    if data.starts_with(JPEG_MAGIC) {
        DetectedFormat::Jpeg
    } else if data.starts_with(PNG_MAGIC) {
        DetectedFormat::Png
    } else if data.starts_with(GIF_MAGIC) {
        DetectedFormat::Gif
    } else if data.len() >= 12 && data.starts_with(RIFF_MAGIC) && &data[8..12] == WEBP_MARKER {
        DetectedFormat::WebP
    } else if data.starts_with(BMP_MAGIC) {
        DetectedFormat::Bmp
    } else if data.starts_with(TIFF_LE_MAGIC) || data.starts_with(TIFF_BE_MAGIC) {
        DetectedFormat::Tiff
    } else {
        DetectedFormat::Unknown
    }
}

//! JPEG + base64 encoding of transformed thumbnails

use crate::error::{AppError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageOutputFormat, RgbaImage};
use std::io::Cursor;

pub const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Encode as JPEG at `quality` (1-100). Alpha is dropped.
pub fn encode_jpeg(pixels: RgbaImage, quality: u8) -> Result<Vec<u8>> {
    let (width, height) = pixels.dimensions();
    if width == 0 || height == 0 {
        return Err(AppError::Encode(format!(
            "cannot encode a {width}x{height} image"
        )));
    }

    let rgb = DynamicImage::ImageRgba8(pixels).to_rgb8();

    // rough JPEG size at thumbnail qualities
    let mut buf = Vec::with_capacity(width as usize * height as usize * 3 / 10);
    DynamicImage::ImageRgb8(rgb)
        .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Jpeg(quality.clamp(1, 100)))
        .map_err(|e| AppError::Encode(e.to_string()))?;

    Ok(buf)
}

/// Standard-alphabet base64 with `=` padding, optionally as a data URI
pub fn encode_text(jpeg: &[u8], data_uri: bool) -> String {
    if data_uri {
        let mut out = String::with_capacity(DATA_URI_PREFIX.len() + jpeg.len().div_ceil(3) * 4);
        out.push_str(DATA_URI_PREFIX);
        STANDARD.encode_string(jpeg, &mut out);
        out
    } else {
        STANDARD.encode(jpeg)
    }
}

//! Thumbnail size planning
//!
//! Fits the original dimensions into the requested box while keeping the
//! aspect ratio. Never upscales.

use crate::models::Dimensions;

/// Width used when the caller leaves both bounds unspecified
pub const DEFAULT_TARGET_WIDTH: i32 = 20;

/// Compute thumbnail dimensions.
///
/// `requested_width`/`requested_height` values `<= 0` mean "unspecified"; a
/// missing side is derived from the other using the original aspect ratio.
/// Truncation may produce a zero-sized result for extreme aspect ratios.
pub fn plan_dimensions(
    original_width: u32,
    original_height: u32,
    requested_width: i32,
    requested_height: i32,
) -> Dimensions {
    if original_width == 0 || original_height == 0 {
        return Dimensions::new(original_width, original_height);
    }

    let (orig_w, orig_h) = (f64::from(original_width), f64::from(original_height));
    let mut target_w = requested_width;
    let mut target_h = requested_height;

    if target_w <= 0 && target_h <= 0 {
        target_w = DEFAULT_TARGET_WIDTH;
    }

    if target_w <= 0 {
        target_w = (f64::from(target_h) * (orig_w / orig_h)) as i32;
    } else if target_h <= 0 {
        target_h = (f64::from(target_w) * (orig_h / orig_w)) as i32;
    }

    let (target_w, target_h) = (target_w.max(0) as u32, target_h.max(0) as u32);

    if original_width <= target_w && original_height <= target_h {
        return Dimensions::new(original_width, original_height);
    }

    let width_ratio = f64::from(target_w) / orig_w;
    let height_ratio = f64::from(target_h) / orig_h;
    let ratio = width_ratio.min(height_ratio);

    Dimensions::new((orig_w * ratio) as u32, (orig_h * ratio) as u32)
}

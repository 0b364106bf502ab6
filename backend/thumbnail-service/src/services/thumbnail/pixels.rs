//! Pixel-level transforms over RGBA buffers
//!
//! Nearest-neighbor resize and a radius-1 box blur. Both are single pass and
//! meant for thumbnail-sized buffers; the blur is O(width * height * 9).

use crate::models::Dimensions;
use image::{Rgba, RgbaImage};

/// Box blur radius (3x3 neighborhood)
pub const BLUR_RADIUS: u32 = 1;

/// Resize with nearest-neighbor sampling.
///
/// Destination pixel `(x, y)` takes source pixel
/// `(x * src_w / dest_w, y * src_h / dest_h)` using integer division.
/// Equal dimensions return the source untouched.
pub fn resize_nearest(src: RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (src_w, src_h) = src.dimensions();
    if src_w == width && src_h == height {
        return src;
    }

    let mut out = RgbaImage::new(width, height);
    if src_w == 0 || src_h == 0 {
        return out;
    }

    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let sx = (u64::from(x) * u64::from(src_w) / u64::from(width)) as u32;
        let sy = (u64::from(y) * u64::from(src_h) / u64::from(height)) as u32;
        *pixel = *src.get_pixel(sx, sy);
    }

    out
}

/// Average every channel over the in-bounds 3x3 neighborhood.
///
/// The neighborhood is clamped at the borders, so edge pixels average six
/// samples and corners four.
pub fn box_blur(src: &RgbaImage) -> RgbaImage {
    let (width, height) = src.dimensions();
    let mut out = RgbaImage::new(width, height);

    for y in 0..height {
        let y0 = y.saturating_sub(BLUR_RADIUS);
        let y1 = (y + BLUR_RADIUS).min(height - 1);

        for x in 0..width {
            let x0 = x.saturating_sub(BLUR_RADIUS);
            let x1 = (x + BLUR_RADIUS).min(width - 1);

            let mut sum = [0u32; 4];
            let mut count = 0u32;
            for ny in y0..=y1 {
                for nx in x0..=x1 {
                    let Rgba(channels) = *src.get_pixel(nx, ny);
                    for (acc, value) in sum.iter_mut().zip(channels) {
                        *acc += u32::from(value);
                    }
                    count += 1;
                }
            }

            out.put_pixel(x, y, Rgba(sum.map(|total| (total / count) as u8)));
        }
    }

    out
}

/// Resize to the planned dimensions, then blur when requested
pub fn transform(src: RgbaImage, target: Dimensions, blur: bool) -> RgbaImage {
    let resized = resize_nearest(src, target.width, target.height);
    if blur {
        box_blur(&resized)
    } else {
        resized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 7, 255]))
    }

    #[test]
    fn test_resize_same_size_is_noop() {
        let src = gradient(5, 4);
        let copy = src.clone();
        assert_eq!(resize_nearest(src, 5, 4), copy);
    }

    #[test]
    fn test_resize_samples_nearest_source_pixel() {
        let src = gradient(10, 6);
        let out = resize_nearest(src, 5, 3);
        assert_eq!(out.dimensions(), (5, 3));
        // x * 10 / 5 = 2x, y * 6 / 3 = 2y
        for (x, y, pixel) in out.enumerate_pixels() {
            assert_eq!(pixel[0], (2 * x) as u8);
            assert_eq!(pixel[1], (2 * y) as u8);
        }
    }

    #[test]
    fn test_resize_to_zero_is_empty() {
        let out = resize_nearest(gradient(4, 4), 0, 3);
        assert_eq!(out.dimensions(), (0, 3));
        assert!(out.as_raw().is_empty());
    }

    #[test]
    fn test_resize_is_lossy_round_trip() {
        let src = gradient(6, 6);
        let down = resize_nearest(src.clone(), 3, 3);
        let up = resize_nearest(down, 6, 6);
        assert_ne!(up, src);
    }

    #[test]
    fn test_blur_uniform_is_fixed_point() {
        let src = RgbaImage::from_pixel(7, 5, Rgba([120, 33, 250, 200]));
        assert_eq!(box_blur(&src), src);
    }

    #[test]
    fn test_blur_clamps_neighborhood_at_edges() {
        // 3x3 with a single bright center pixel
        let mut src = RgbaImage::from_pixel(3, 3, Rgba([0, 0, 0, 0]));
        src.put_pixel(1, 1, Rgba([180, 90, 36, 255]));

        let out = box_blur(&src);
        // center sees all 9 samples
        assert_eq!(*out.get_pixel(1, 1), Rgba([20, 10, 4, 28]));
        // corner sees 4 samples
        assert_eq!(*out.get_pixel(0, 0), Rgba([45, 22, 9, 63]));
        // edge sees 6 samples
        assert_eq!(*out.get_pixel(1, 0), Rgba([30, 15, 6, 42]));
    }

    #[test]
    fn test_blur_single_pixel_and_empty() {
        let single = RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 4]));
        assert_eq!(box_blur(&single), single);

        let empty = RgbaImage::new(0, 0);
        assert_eq!(box_blur(&empty).dimensions(), (0, 0));
    }

    #[test]
    fn test_transform_resizes_then_blurs() {
        let src = RgbaImage::from_pixel(40, 20, Rgba([10, 20, 30, 255]));
        let out = transform(src, Dimensions::new(20, 10), true);
        assert_eq!(out.dimensions(), (20, 10));
        assert_eq!(*out.get_pixel(0, 0), Rgba([10, 20, 30, 255]));
    }
}

//! Image inspection utilities for testing.

use image::{DynamicImage, ImageError, ImageFormat, RgbaImage};
use std::collections::HashSet;
use std::path::Path;

/// Load an image from a file
pub fn load_image(path: &Path) -> Result<DynamicImage, ImageError> {
    image::open(path)
}

/// Detect image format from bytes
pub fn detect_image_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes).ok()
}

/// Number of distinct RGBA values in an image
pub fn distinct_colors(img: &RgbaImage) -> usize {
    img.pixels().map(|p| p.0).collect::<HashSet<_>>().len()
}

/// Count pixels equal to `color`
pub fn count_pixels(img: &RgbaImage, color: [u8; 4]) -> usize {
    img.pixels().filter(|p| p.0 == color).count()
}

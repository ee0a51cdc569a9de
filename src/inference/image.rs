//! Image preparation for the vision model

use std::io::Cursor;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageOutputFormat};

use crate::inference::InferenceError;

/// Longest side sent to the vision model; UI text stays legible at this size
pub const MAX_IMAGE_SIDE: u32 = 2048;

/// Load an image, flatten it to RGB, shrink it to fit [`MAX_IMAGE_SIDE`] and
/// return it as base64-encoded PNG.
pub fn encode_image(path: &Path) -> Result<String, InferenceError> {
    let img = image::open(path)?;
    tracing::info!(
        "Original image size: {}x{}",
        img.width(),
        img.height()
    );

    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let prepared = fit_within(rgb, MAX_IMAGE_SIDE);

    let mut buffer = Cursor::new(Vec::new());
    prepared.write_to(&mut buffer, ImageOutputFormat::Png)?;
    let encoded = STANDARD.encode(buffer.into_inner());

    tracing::info!("Encoded image size: {} characters (PNG)", encoded.len());
    Ok(encoded)
}

fn fit_within(img: DynamicImage, max_side: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width.max(height) <= max_side {
        return img;
    }
    let resized = img.resize(max_side, max_side, FilterType::Lanczos3);
    tracing::debug!(
        "Resized image from {}x{} to {}x{}",
        width,
        height,
        resized.width(),
        resized.height()
    );
    resized
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    fn decode(encoded: &str) -> DynamicImage {
        let bytes = STANDARD.decode(encoded).unwrap();
        image::load_from_memory(&bytes).unwrap()
    }

    #[test]
    fn test_large_image_is_downscaled_keeping_aspect() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wide.png");
        RgbaImage::from_pixel(4096, 1024, Rgba([10, 20, 30, 128]))
            .save(&path)
            .unwrap();

        let out = decode(&encode_image(&path).unwrap());
        assert_eq!(out.dimensions(), (2048, 512));
        assert!(matches!(out, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn test_small_image_keeps_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("small.png");
        RgbaImage::new(300, 200).save(&path).unwrap();

        let out = decode(&encode_image(&path).unwrap());
        assert_eq!(out.dimensions(), (300, 200));
    }

    #[test]
    fn test_missing_file_errors() {
        assert!(encode_image(Path::new("/definitely/missing.png")).is_err());
    }
}

// src/image_prep.rs

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;
use tracing::info;

/// Resize a form photo for the vision model and re-encode it as PNG.
///
/// Color is forced to RGB and the longest edge is bounded at
/// `max_dimension` with the aspect ratio preserved; images already within
/// bounds are only re-encoded.
pub fn prepare_for_vision(
    image_bytes: &[u8],
    max_dimension: u32,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let decoded = image::load_from_memory(image_bytes)?;
    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());

    let (width, height) = rgb.dimensions();
    let bounded = if width.max(height) > max_dimension {
        let resized = rgb.resize(max_dimension, max_dimension, FilterType::Lanczos3);
        info!(
            from = format!("{width}x{height}"),
            to = format!("{}x{}", resized.width(), resized.height()),
            "Downscaled form image"
        );
        resized
    } else {
        rgb
    };

    encode_png(&bounded)
}

/// Grayscale contrast stretch for faint forms: each pixel moves away from
/// mid-gray by a factor of 1.2, clamped to the valid range.
pub fn enhance_contrast(image_bytes: &[u8]) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut gray = image::load_from_memory(image_bytes)?.to_luma8();
    for pixel in gray.pixels_mut() {
        let stretched = (f32::from(pixel.0[0]) - 128.0) * 1.2 + 128.0;
        pixel.0[0] = stretched.clamp(0.0, 255.0) as u8;
    }
    encode_png(&DynamicImage::ImageLuma8(gray))
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn png_of(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 180, 40]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn small_image_keeps_dimensions() {
        let prepared = prepare_for_vision(&png_of(40, 30), 1600).unwrap();
        let reloaded = image::load_from_memory(&prepared).unwrap();
        assert_eq!(reloaded.dimensions(), (40, 30));
    }

    #[test]
    fn oversized_image_is_bounded_preserving_aspect() {
        let prepared = prepare_for_vision(&png_of(400, 200), 100).unwrap();
        let reloaded = image::load_from_memory(&prepared).unwrap();
        assert_eq!(reloaded.dimensions(), (100, 50));
    }

    #[test]
    fn garbage_bytes_error() {
        assert!(prepare_for_vision(b"this is not an image", 1600).is_err());
        assert!(enhance_contrast(b"this is not an image").is_err());
    }

    #[test]
    fn contrast_stretch_moves_pixels_from_mid_gray() {
        let enhanced = enhance_contrast(&png_of(4, 4)).unwrap();
        let gray = image::load_from_memory(&enhanced).unwrap().to_luma8();
        // Luma of (200, 180, 40) is ~165; stretched: (165-128)*1.2+128 = ~172.
        let p = gray.get_pixel(0, 0).0[0];
        assert!(p > 165, "expected brightened pixel, got {p}");
    }
}

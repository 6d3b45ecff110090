//! Image preprocessing for inference.
//!
//! These functions decode image bytes (PNG/JPEG/BMP/GIF), resize them to the
//! dimensions a model expects, and normalize pixel values to the [0, 1]
//! range ready for a forward pass.

use crate::error::KilnError;

/// Decodes image bytes, resizes to `width × height`, converts to grayscale,
/// and normalizes pixels to [0, 1].
///
/// Returns a flat `Vec<f64>` of length `width * height`.
pub fn grayscale_input(bytes: &[u8], width: u32, height: u32) -> Result<Vec<f64>, KilnError> {
    let img = image::load_from_memory(bytes)?;
    let resized = img.resize_exact(width, height, image::imageops::FilterType::Lanczos3);
    let gray = resized.to_luma8();
    Ok(gray.pixels().map(|p| p.0[0] as f64 / 255.0).collect())
}

/// Decodes image bytes, resizes to `width × height`, and flattens as
/// R, G, B, ... normalized to [0, 1].
///
/// Returns a flat `Vec<f64>` of length `width * height * 3`.
pub fn rgb_input(bytes: &[u8], width: u32, height: u32) -> Result<Vec<f64>, KilnError> {
    let img = image::load_from_memory(bytes)?;
    let resized = img.resize_exact(width, height, image::imageops::FilterType::Lanczos3);
    let rgb = resized.to_rgb8();
    Ok(rgb.pixels().flat_map(|p| p.0.iter().map(|&c| c as f64 / 255.0)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bytes_that_are_not_an_image() {
        assert!(grayscale_input(b"definitely not a png", 8, 8).is_err());
    }

    #[test]
    fn decodes_a_png_to_normalized_grayscale() {
        // Encode a tiny gradient and run it back through the pipeline.
        let mut png = Vec::new();
        let img = image::GrayImage::from_fn(4, 4, |x, y| image::Luma([(x * 60 + y * 4) as u8]));
        image::DynamicImage::ImageLuma8(img)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageOutputFormat::Png)
            .unwrap();

        let input = grayscale_input(&png, 4, 4).unwrap();
        assert_eq!(input.len(), 16);
        assert!(input.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }
}

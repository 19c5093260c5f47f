//! Post-processing of raw element screenshots.
//!
//! Screenshots arrive as PNG. They are flattened onto the configured
//! background and re-encoded in the run's output format.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};

use crate::browser::ImageFormat;
use crate::error::{Error, Result};

use super::config::Color;
use super::record::CaptureRecord;

/// Decodes `png`, composites it over `background` and encodes it as `format`.
///
/// # Errors
///
/// - [`Error::Render`] if the screenshot cannot be decoded or has no pixels
pub fn encode_capture(png: &[u8], background: Color, format: ImageFormat) -> Result<CaptureRecord> {
    let decoded = image::load_from_memory(png)
        .map_err(|e| Error::render(format!("Failed to decode screenshot: {e}")))?;

    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::render("Screenshot has zero dimensions"));
    }

    let flat = RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        Rgb([
            blend(r, background.r, a),
            blend(g, background.g, a),
            blend(b, background.b, a),
        ])
    });

    let mut data = Vec::new();
    match format {
        ImageFormat::Png => {
            PngEncoder::new(&mut data).write_image(
                flat.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )?;
        }
        ImageFormat::Jpeg(quality) => {
            JpegEncoder::new_with_quality(&mut data, quality.clamp(1, 100)).write_image(
                flat.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )?;
        }
    }

    Ok(CaptureRecord::new(data, format, width, height))
}

/// Source-over compositing of one channel onto an opaque background.
#[inline]
fn blend(fg: u8, bg: u8, alpha: u8) -> u8 {
    let a = u32::from(alpha);
    ((u32::from(fg) * a + u32::from(bg) * (255 - a) + 127) / 255) as u8
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use image::{Rgba, RgbaImage};

    fn transparent_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
        let mut buf = Vec::new();
        PngEncoder::new(&mut buf)
            .write_image(img.as_raw(), width, height, ExtendedColorType::Rgba8)
            .expect("encode");
        buf
    }

    #[test]
    fn test_blend() {
        assert_eq!(blend(10, 200, 255), 10);
        assert_eq!(blend(10, 200, 0), 200);
        assert_eq!(blend(0, 255, 128), 127);
    }

    #[test]
    fn test_transparent_becomes_background() {
        let record = encode_capture(
            &transparent_png(4, 2),
            Color { r: 0, g: 128, b: 255 },
            ImageFormat::Png,
        )
        .expect("encode");

        assert_eq!((record.width_px(), record.height_px()), (4, 2));
        let decoded = image::load_from_memory(record.data()).expect("decode").to_rgb8();
        assert_eq!(decoded.get_pixel(3, 1).0, [0, 128, 255]);
    }

    #[test]
    fn test_jpeg_output() {
        let record =
            encode_capture(&transparent_png(16, 8), Color::WHITE, ImageFormat::Jpeg(100))
                .expect("encode");

        assert_eq!(record.format(), ImageFormat::Jpeg(100));
        assert_eq!(&record.data()[..2], &[0xFF, 0xD8]);
        assert_eq!((record.width_px(), record.height_px()), (16, 8));
    }

    #[test]
    fn test_garbage_is_render_error() {
        let err = encode_capture(b"nope", Color::WHITE, ImageFormat::Png).unwrap_err();
        assert!(matches!(err, Error::Render { .. }));
    }
}

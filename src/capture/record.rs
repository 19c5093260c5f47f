//! Captured page images.

use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::browser::ImageFormat;
use crate::error::{Error, Result};

// ============================================================================
// CaptureRecord
// ============================================================================

/// One encoded page image and its pixel size.
///
/// Records have no identity beyond their position in a run.
#[derive(Clone, PartialEq, Eq)]
pub struct CaptureRecord {
    data: Vec<u8>,
    format: ImageFormat,
    width_px: u32,
    height_px: u32,
}

impl fmt::Debug for CaptureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureRecord")
            .field("format", &self.format)
            .field("width_px", &self.width_px)
            .field("height_px", &self.height_px)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl CaptureRecord {
    /// Creates a record from already-encoded bytes.
    #[must_use]
    pub fn new(data: Vec<u8>, format: ImageFormat, width_px: u32, height_px: u32) -> Self {
        Self {
            data,
            format,
            width_px,
            height_px,
        }
    }

    /// Creates a record from PNG or JPEG bytes, reading the size from the header.
    ///
    /// # Errors
    ///
    /// - [`Error::Render`] if the bytes are neither PNG nor JPEG
    /// - [`Error::Image`] if the header cannot be read
    pub fn from_encoded(data: Vec<u8>) -> Result<Self> {
        let reader = image::ImageReader::new(Cursor::new(&data)).with_guessed_format()?;

        let format = match reader.format() {
            Some(image::ImageFormat::Png) => ImageFormat::Png,
            Some(image::ImageFormat::Jpeg) => ImageFormat::Jpeg(100),
            other => {
                return Err(Error::render(format!(
                    "Unsupported image encoding: {other:?}"
                )));
            }
        };

        let (width_px, height_px) = reader.into_dimensions()?;
        Ok(Self::new(data, format, width_px, height_px))
    }

    /// Reads a PNG or JPEG file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_encoded(data)
    }

    /// Returns the encoded bytes.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the encoding.
    #[inline]
    #[must_use]
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Returns the width in pixels.
    #[inline]
    #[must_use]
    pub fn width_px(&self) -> u32 {
        self.width_px
    }

    /// Returns the height in pixels.
    #[inline]
    #[must_use]
    pub fn height_px(&self) -> u32 {
        self.height_px
    }
}

// ============================================================================
// Directory Loading
// ============================================================================

/// Loads every PNG/JPEG in `dir`, in page order.
///
/// Files named by page index (`0.png`, `1.png`, ..., `10.png`) sort
/// numerically; other names sort after them by name.
///
/// # Errors
///
/// - [`Error::EmptyInput`] if the directory holds no images
pub fn load_dir(dir: impl AsRef<Path>) -> Result<Vec<CaptureRecord>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir.as_ref())?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_image_path(path))
        .collect();

    if paths.is_empty() {
        return Err(Error::EmptyInput);
    }

    paths.sort_by_cached_key(|path| page_sort_key(path));
    debug!(dir = %dir.as_ref().display(), count = paths.len(), "Loading page images");

    paths.iter().map(CaptureRecord::load).collect()
}

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
        .unwrap_or(false)
}

fn page_sort_key(path: &Path) -> (bool, u64, String) {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    match stem.parse::<u64>() {
        Ok(index) => (false, index, stem),
        Err(_) => (true, 0, stem),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use image::{ImageEncoder, Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 10, 10]));
        let mut buf = Vec::new();
        image::codecs::png::PngEncoder::new(&mut buf)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .expect("encode");
        buf
    }

    #[test]
    fn test_from_encoded_reads_png_size() {
        let record = CaptureRecord::from_encoded(png_bytes(7, 3)).expect("record");
        assert_eq!(record.format(), ImageFormat::Png);
        assert_eq!((record.width_px(), record.height_px()), (7, 3));
    }

    #[test]
    fn test_from_encoded_rejects_garbage() {
        assert!(CaptureRecord::from_encoded(b"not an image".to_vec()).is_err());
    }

    #[test]
    fn test_load_dir_orders_numerically() {
        let dir = tempfile::tempdir().expect("tempdir");
        for (name, width) in [("10.png", 10), ("2.png", 2), ("0.png", 1), ("notes.txt", 0)] {
            let bytes = if width == 0 {
                b"skip".to_vec()
            } else {
                png_bytes(width, 4)
            };
            std::fs::write(dir.path().join(name), bytes).expect("write");
        }

        let records = load_dir(dir.path()).expect("load");
        let widths: Vec<u32> = records.iter().map(CaptureRecord::width_px).collect();
        assert_eq!(widths, vec![1, 2, 10]);
    }

    #[test]
    fn test_load_dir_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(load_dir(dir.path()), Err(Error::EmptyInput)));
    }
}

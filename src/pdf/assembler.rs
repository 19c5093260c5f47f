//! Builds a PDF with one page per captured image.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use image::ImageDecoder;
use image::codecs::jpeg::JpegDecoder;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};
use tracing::{debug, info};

use crate::browser::ImageFormat;
use crate::capture::CaptureRecord;
use crate::error::{Error, Result};

use super::geometry::PageGeometry;
use super::layout::fit_image;

// ============================================================================
// Constants
// ============================================================================

const PDF_VERSION: &str = "1.7";

const PRODUCER: &str = concat!("page-capture ", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Public API
// ============================================================================

/// Renders `records` into PDF bytes, one page each, in order.
///
/// # Errors
///
/// - [`Error::EmptyInput`] if `records` is empty
/// - [`Error::Config`] if the geometry is invalid
pub fn build_pdf(records: &[CaptureRecord], geometry: &PageGeometry) -> Result<Vec<u8>> {
    if records.is_empty() {
        return Err(Error::EmptyInput);
    }
    geometry.validate()?;

    let mut doc = Document::with_version(PDF_VERSION);
    let pages_id = doc.new_object_id();
    let (page_w_pt, page_h_pt) = geometry.page_size_points();
    let (page_w, page_h) = geometry.page_size();
    let unit = geometry.unit;

    let mut kids = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let image_id = doc.add_object(image_stream(record)?);

        let placement = fit_image(
            record.width_px(),
            record.height_px(),
            page_w,
            page_h,
            geometry.margin,
        );
        let draw_w = unit.to_points(placement.width);
        let draw_h = unit.to_points(placement.height);
        let x = unit.to_points(placement.x);
        let y = page_h_pt - unit.to_points(placement.y) - draw_h;

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        real(draw_w),
                        real(0.0),
                        real(0.0),
                        real(draw_h),
                        real(x),
                        real(y),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![real(0.0), real(0.0), real(page_w_pt), real(page_h_pt)],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im0" => image_id,
                },
            },
        });
        kids.push(Object::Reference(page_id));

        debug!(
            page = index + 1,
            width_px = record.width_px(),
            height_px = record.height_px(),
            x,
            y,
            draw_w,
            draw_h,
            "Placed page image"
        );
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Producer" => Object::string_literal(PRODUCER),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc.trailer.set("Info", Object::Reference(info_id));

    doc.compress();

    let mut output = Vec::new();
    doc.save_to(&mut output)?;
    Ok(output)
}

/// Export file name for a given instant: `capture_YYYY-MM-DD-HH-MM-SS.pdf`.
#[must_use]
pub fn export_filename(at: DateTime<Utc>) -> String {
    format!("capture_{}.pdf", at.format("%Y-%m-%d-%H-%M-%S"))
}

/// Builds the PDF and writes it as `dir/capture_<timestamp>.pdf`.
///
/// Nothing is written when `records` is empty.
pub fn write_pdf(
    records: &[CaptureRecord],
    geometry: &PageGeometry,
    dir: impl AsRef<Path>,
) -> Result<PathBuf> {
    let bytes = build_pdf(records, geometry)?;

    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_filename(Utc::now()));
    std::fs::write(&path, &bytes)?;

    info!(path = %path.display(), pages = records.len(), bytes = bytes.len(), "Wrote PDF");
    Ok(path)
}

// ============================================================================
// Helper Functions
// ============================================================================

#[inline]
fn real(value: f64) -> Object {
    Object::Real(value as _)
}

/// Builds the image XObject for a record.
///
/// JPEG data is embedded as-is; everything else is decoded to RGB and left
/// for `Document::compress` to deflate.
fn image_stream(record: &CaptureRecord) -> Result<Stream> {
    let base = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => record.width_px() as i64,
        "Height" => record.height_px() as i64,
        "BitsPerComponent" => 8,
    };

    if matches!(record.format(), ImageFormat::Jpeg(_))
        && let Some(color_space) = jpeg_color_space(record.data())
    {
        let mut dict = base;
        dict.set("ColorSpace", color_space);
        dict.set("Filter", "DCTDecode");
        return Ok(Stream::new(dict, record.data().to_vec()).with_compression(false));
    }

    let rgb = image::load_from_memory(record.data())?.to_rgb8();
    let mut dict = base;
    dict.set("ColorSpace", "DeviceRGB");
    Ok(Stream::new(dict, rgb.into_raw()))
}

/// Colour space for a JPEG that can be passed through, if any.
fn jpeg_color_space(data: &[u8]) -> Option<&'static str> {
    let decoder = JpegDecoder::new(Cursor::new(data)).ok()?;
    match decoder.color_type() {
        image::ColorType::L8 => Some("DeviceGray"),
        image::ColorType::Rgb8 => Some("DeviceRGB"),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

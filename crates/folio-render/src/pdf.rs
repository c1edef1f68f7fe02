//! JPEG page encoding and PDF assembly.
//!
//! Every exported page becomes one A4 PDF page whose only content is the
//! page raster, embedded as a DCT-encoded image XObject stretched over the
//! full media box.

use crate::error::{ExportError, ExportResult, RenderError, RenderResult};
use crate::surface::RasterSurface;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// A4 width in PDF points.
pub const PDF_PAGE_WIDTH: f32 = 595.28;
/// A4 height in PDF points.
pub const PDF_PAGE_HEIGHT: f32 = 841.89;

const IMAGE_NAME: &str = "Im0";

/// One encoded page image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegPage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Flatten the surface onto white and encode it as baseline JPEG.
pub fn encode_jpeg(surface: &RasterSurface, quality: u8) -> RenderResult<JpegPage> {
    let pixmap = surface.pixmap();
    // Premultiplied source-over white: each channel gains the uncovered share.
    let flattened: Vec<u8> = pixmap
        .data()
        .chunks_exact(4)
        .flat_map(|px| {
            let uncovered = 255 - px[3];
            [px[0].saturating_add(uncovered), px[1].saturating_add(uncovered), px[2].saturating_add(uncovered)]
        })
        .collect();
    let rgb = RgbImage::from_raw(pixmap.width(), pixmap.height(), flattened)
        .ok_or_else(|| RenderError::Encode("pixel buffer size mismatch".to_string()))?;

    let mut data = Vec::new();
    JpegEncoder::new_with_quality(&mut data, quality)
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| RenderError::Encode(e.to_string()))?;

    Ok(JpegPage {
        data,
        width: rgb.width(),
        height: rgb.height(),
    })
}

/// Assemble a PDF with one A4 page per image, in order.
pub fn build_pdf(pages: &[JpegPage]) -> ExportResult<Vec<u8>> {
    if pages.is_empty() {
        return Err(ExportError::NoPages);
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

    for page in pages {
        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(page.width),
                "Height" => i64::from(page.height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            page.data.clone(),
        )
        .with_compression(false);
        let image_id = doc.add_object(image);

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        PDF_PAGE_WIDTH.into(),
                        0.into(),
                        0.into(),
                        PDF_PAGE_HEIGHT.into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content.encode().map_err(|e| ExportError::Pdf(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    IMAGE_NAME => image_id,
                },
            },
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                PDF_PAGE_WIDTH.into(),
                PDF_PAGE_HEIGHT.into(),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(|e| ExportError::Pdf(e.to_string()))?;
    log::debug!("Assembled PDF: {} pages, {} bytes", pages.len(), bytes.len());
    Ok(bytes)
}

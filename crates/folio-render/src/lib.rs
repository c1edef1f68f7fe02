//! Folio Render Library
//!
//! CPU rasterization of document pages and PDF export.

pub mod draw;
pub mod error;
pub mod export;
pub mod pdf;
pub mod rasterizer;
pub mod surface;
pub mod text_layout;

pub use error::{ExportError, ExportResult, RenderError, RenderResult};
pub use export::{ExportJob, ExportOutput, ExportRequest, ExportStatus, export_document, export_document_blocking};
pub use pdf::{JpegPage, build_pdf, encode_jpeg};
pub use rasterizer::{BoxFuture, DataUrlSource, ImageSource, MemoryImageSource, PageRasterizer, RenderOptions};
pub use surface::RasterSurface;
pub use text_layout::{FontSet, TextMeasure};

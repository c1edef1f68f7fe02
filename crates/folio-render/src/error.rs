//! Render and export errors.

use thiserror::Error;

/// Rasterization errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid render options: {0}")]
    InvalidOptions(String),
    #[error("Surface of {width}x{height} pixels could not be allocated")]
    Surface { width: u32, height: u32 },
    #[error("Font could not be loaded: {0}")]
    Font(String),
    #[error("Image {src} could not be loaded: {reason}")]
    ImageLoad { src: String, reason: String },
    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("JPEG encoding failed: {0}")]
    Encode(String),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Export errors. Any of these aborts the whole export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No pages selected for export")]
    NoPages,
    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),
    #[error("PDF assembly failed: {0}")]
    Pdf(String),
}

pub type ExportResult<T> = Result<T, ExportError>;

//! Folio export driver.
//!
//! Reads a document description (JSON), rasterizes the requested pages and
//! writes the resulting PDF files.

use clap::Parser;
use folio_core::ids::{PageId, RandomIds};
use folio_core::model::{DocumentState, ModelError};
use folio_core::store::DocumentStore;
use folio_render::{
    DataUrlSource, ExportError, ExportOutput, ExportRequest, FontSet, RenderError, RenderOptions,
    export_document_blocking,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Export a Folio document to PDF
#[derive(Parser, Debug, Clone)]
#[command(name = "folio-export")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Document JSON file
    #[arg(value_name = "DOCUMENT")]
    pub document: PathBuf,

    /// Directory the PDF files are written to
    #[arg(value_name = "OUT_DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Write one file per page instead of a single merged file
    #[arg(long)]
    pub split: bool,

    /// Pages to export, in order (defaults to every page)
    #[arg(long, value_name = "PAGE_ID", value_delimiter = ',')]
    pub pages: Vec<String>,

    /// Output base name (defaults to the document name)
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Oversampling factor
    #[arg(long, default_value_t = folio_render::rasterizer::DEFAULT_SCALE)]
    pub scale: f64,

    /// Regular font face for text (defaults to the bundled face)
    #[arg(long, env = "FOLIO_FONT", value_name = "FILE")]
    pub font: Option<PathBuf>,

    /// Bold font face for text (defaults to the bundled face)
    #[arg(long, env = "FOLIO_FONT_BOLD", value_name = "FILE")]
    pub font_bold: Option<PathBuf>,
}

/// Driver errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid document: {0}")]
    Model(#[from] ModelError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

pub type Result<T> = std::result::Result<T, AppError>;

fn write_error(path: &Path) -> impl FnOnce(std::io::Error) -> AppError {
    let path = path.to_path_buf();
    move |source| AppError::Write { path, source }
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| AppError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse and validate a document description.
pub fn load_document(path: &Path) -> Result<DocumentState> {
    let bytes = read(path)?;
    let state: DocumentState = serde_json::from_slice(&bytes)?;
    let store = DocumentStore::with_state(state, RandomIds)?;
    let state = store.state();
    log::debug!("Loaded '{}' with {} page(s)", state.name, state.pages.len());
    Ok(DocumentState::clone(&state))
}

fn load_fonts(args: &Args) -> Result<FontSet> {
    let regular = args.font.as_deref().map(read).transpose()?;
    let bold = args.font_bold.as_deref().map(read).transpose()?;
    Ok(FontSet::bundled().with_overrides(regular, bold)?)
}

/// Build the export request described by `args`.
pub fn export_request(args: &Args, state: &DocumentState) -> ExportRequest {
    let mut request = ExportRequest::all_pages(state).with_merge(!args.split);
    if !args.pages.is_empty() {
        request = request.with_pages(args.pages.iter().map(PageId::new));
    }
    if let Some(name) = &args.name {
        request.base_name = name.clone();
    }
    request
}

/// Run one export. Files are written only once every page rendered.
pub fn run(args: &Args) -> Result<Vec<PathBuf>> {
    let state = load_document(&args.document)?;
    let options = RenderOptions::default()
        .with_scale(args.scale)
        .with_fonts(load_fonts(args)?);
    let base_dir = args
        .document
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let source = DataUrlSource::new().with_base_dir(base_dir);

    let outputs = export_document_blocking(&state, &export_request(args, &state), &options, &source)?;
    write_outputs(&args.out_dir, outputs)
}

/// Write every output or none of them.
///
/// Outputs are staged as temporary files in `out_dir` and renamed into place
/// once all of them are written. If a rename fails, files already moved into
/// place are removed again.
pub fn write_outputs(out_dir: &Path, outputs: Vec<ExportOutput>) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).map_err(write_error(out_dir))?;

    let mut staged = Vec::with_capacity(outputs.len());
    for output in outputs {
        let path = out_dir.join(&output.file_name);
        let mut file = NamedTempFile::new_in(out_dir).map_err(write_error(&path))?;
        file.write_all(&output.bytes).map_err(write_error(&path))?;
        staged.push((file, path));
    }

    let mut written: Vec<PathBuf> = Vec::with_capacity(staged.len());
    for (file, path) in staged {
        if let Err(e) = file.persist(&path) {
            for done in &written {
                if let Err(err) = fs::remove_file(done) {
                    log::warn!("Failed to remove {}: {err}", done.display());
                }
            }
            return Err(AppError::Write { path, source: e.error });
        }
        log::info!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

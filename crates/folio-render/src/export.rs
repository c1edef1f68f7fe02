//! Document export: rasterize selected pages and assemble PDF files.

use crate::error::{ExportError, ExportResult};
use crate::pdf::{JpegPage, build_pdf, encode_jpeg};
use crate::rasterizer::{ImageSource, PageRasterizer, RenderOptions};
use folio_core::ids::PageId;
use folio_core::model::DocumentState;
use std::time::{Duration, Instant};

/// Base name used when the caller supplies none.
pub const DEFAULT_BASE_NAME: &str = "document";

/// How long a success status stays visible.
pub const SUCCESS_DISMISS_DELAY: Duration = Duration::from_millis(1500);

/// What to export and how to name it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub base_name: String,
    /// Pages in output order.
    pub page_ids: Vec<PageId>,
    /// One multi-page file when set, one file per page otherwise.
    pub merge: bool,
}

impl Default for ExportRequest {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_NAME)
    }
}

impl ExportRequest {
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            page_ids: Vec::new(),
            merge: true,
        }
    }

    /// Every page of the document, in document order.
    pub fn all_pages(state: &DocumentState) -> Self {
        Self::new(state.name.clone()).with_pages(state.pages.iter().map(|p| p.id.clone()))
    }

    pub fn with_pages(mut self, page_ids: impl IntoIterator<Item = PageId>) -> Self {
        self.page_ids = page_ids.into_iter().collect();
        self
    }

    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }

    /// Base name with blanks defaulted and a trailing `.pdf` removed.
    pub fn normalized_base_name(&self) -> String {
        let trimmed = self.base_name.trim();
        let stem = match trimmed.len().checked_sub(4) {
            Some(cut) if trimmed.is_char_boundary(cut) && trimmed[cut..].eq_ignore_ascii_case(".pdf") => {
                trimmed[..cut].trim_end()
            }
            _ => trimmed,
        };
        if stem.is_empty() {
            DEFAULT_BASE_NAME.to_string()
        } else {
            stem.to_string()
        }
    }

    /// File name for a merged export.
    pub fn merged_file_name(&self) -> String {
        format!("{}.pdf", self.normalized_base_name())
    }

    /// File name for the `index`-th (1-based) page of a split export.
    pub fn page_file_name(&self, index: usize) -> String {
        format!("{}_page{}.pdf", self.normalized_base_name(), index)
    }
}

/// One produced file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutput {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Rasterize and assemble the requested pages.
///
/// Unknown page ids are skipped. Any render or assembly failure aborts the
/// whole export and nothing is returned.
pub async fn export_document(
    state: &DocumentState,
    request: &ExportRequest,
    options: &RenderOptions,
    source: &dyn ImageSource,
) -> ExportResult<Vec<ExportOutput>> {
    let pages: Vec<_> = request
        .page_ids
        .iter()
        .filter_map(|id| {
            let page = state.page(id);
            if page.is_none() {
                log::warn!("Skipping unknown page {id} in export");
            }
            page
        })
        .collect();
    if pages.is_empty() {
        return Err(ExportError::NoPages);
    }

    log::info!("Exporting {} page(s) of '{}'", pages.len(), state.name);
    let rasterizer = PageRasterizer::new(options, source);
    let mut encoded: Vec<JpegPage> = Vec::with_capacity(pages.len());
    for page in &pages {
        let surface = rasterizer.rasterize(page).await?;
        encoded.push(encode_jpeg(&surface, options.jpeg_quality)?);
    }

    let outputs = if request.merge {
        vec![ExportOutput {
            file_name: request.merged_file_name(),
            bytes: build_pdf(&encoded)?,
        }]
    } else {
        encoded
            .chunks(1)
            .enumerate()
            .map(|(index, page)| {
                Ok(ExportOutput {
                    file_name: request.page_file_name(index + 1),
                    bytes: build_pdf(page)?,
                })
            })
            .collect::<ExportResult<Vec<_>>>()?
    };

    log::info!(
        "Export finished: {}",
        outputs.iter().map(|o| o.file_name.as_str()).collect::<Vec<_>>().join(", ")
    );
    Ok(outputs)
}

/// Blocking wrapper around [`export_document`].
pub fn export_document_blocking(
    state: &DocumentState,
    request: &ExportRequest,
    options: &RenderOptions,
    source: &dyn ImageSource,
) -> ExportResult<Vec<ExportOutput>> {
    pollster::block_on(export_document(state, request, options, source))
}

/// Visible export status.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExportStatus {
    #[default]
    Idle,
    Generating,
    Success,
    Error(String),
}

/// Tracks one export at a time and dismisses success after a delay.
#[derive(Debug, Clone, Default)]
pub struct ExportJob {
    status: ExportStatus,
    finished_at: Option<Instant>,
}

impl ExportJob {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &ExportStatus {
        &self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == ExportStatus::Generating
    }

    /// Returns false if an export is already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            log::debug!("Export already in progress");
            return false;
        }
        self.status = ExportStatus::Generating;
        self.finished_at = None;
        true
    }

    /// Record the outcome; the outputs pass through for the caller to persist.
    pub fn finish<T>(&mut self, result: ExportResult<T>, now: Instant) -> Option<T> {
        self.finished_at = Some(now);
        match result {
            Ok(value) => {
                self.status = ExportStatus::Success;
                Some(value)
            }
            Err(e) => {
                log::error!("Export failed: {e}");
                self.status = ExportStatus::Error(e.to_string());
                None
            }
        }
    }

    /// Clear a success status once its delay has elapsed. Errors stay.
    pub fn tick(&mut self, now: Instant) {
        if self.status != ExportStatus::Success {
            return;
        }
        let elapsed = self.finished_at.map(|finished| now.saturating_duration_since(finished));
        if elapsed.is_some_and(|elapsed| elapsed >= SUCCESS_DISMISS_DELAY) {
            self.status = ExportStatus::Idle;
            self.finished_at = None;
        }
    }

    /// Dismiss whatever is shown.
    pub fn dismiss(&mut self) {
        if !self.is_running() {
            self.status = ExportStatus::Idle;
            self.finished_at = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::DataUrlSource;
    use folio_core::ids::SequentialIds;
    use folio_core::model;
    use kurbo::Point;
    use lopdf::Document;

    fn document(pages: usize) -> DocumentState {
        let mut ids = SequentialIds::new();
        let pages = (0..pages)
            .map(|_| {
                let mut page = model::create_page(&mut ids);
                page.elements.push(model::create_shape_element(&mut ids, Point::new(10.0, 10.0)));
                page
            })
            .collect();
        DocumentState {
            id: "doc-1".to_string(),
            name: "Brochure".to_string(),
            pages,
            selected_page_id: None,
            selected_element_id: None,
        }
    }

    fn export(state: &DocumentState, request: &ExportRequest) -> ExportResult<Vec<ExportOutput>> {
        let options = RenderOptions::default().with_scale(0.25);
        export_document_blocking(state, request, &options, &DataUrlSource::new())
    }

    #[test]
    fn test_normalized_base_name() {
        assert_eq!(ExportRequest::new("").normalized_base_name(), "document");
        assert_eq!(ExportRequest::new("  ").normalized_base_name(), "document");
        assert_eq!(ExportRequest::new("report.pdf").normalized_base_name(), "report");
        assert_eq!(ExportRequest::new("Report.PDF").normalized_base_name(), "Report");
        assert_eq!(ExportRequest::new(".pdf").normalized_base_name(), "document");
        assert_eq!(ExportRequest::new("flyer").page_file_name(3), "flyer_page3.pdf");
    }

    #[test]
    fn test_default_request_merges() {
        let request = ExportRequest::default();
        assert!(request.merge);
        assert_eq!(request, ExportRequest::new(DEFAULT_BASE_NAME));
        assert_eq!(request.merged_file_name(), "document.pdf");
    }

    #[test]
    fn test_merged_export_keeps_selected_order() {
        let state = document(3);
        let request = ExportRequest::new("out")
            .with_pages([state.pages[2].id.clone(), state.pages[0].id.clone()])
            .with_merge(true);
        let outputs = export(&state, &request).unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].file_name, "out.pdf");
        let pdf = Document::load_mem(&outputs[0].bytes).unwrap();
        assert_eq!(pdf.get_pages().len(), 2);
    }

    #[test]
    fn test_split_export_names_pages_from_one() {
        let state = document(2);
        let request = ExportRequest::all_pages(&state).with_merge(false);
        let outputs = export(&state, &request).unwrap();
        let names: Vec<_> = outputs.iter().map(|o| o.file_name.as_str()).collect();
        assert_eq!(names, ["Brochure_page1.pdf", "Brochure_page2.pdf"]);
        for output in &outputs {
            assert_eq!(Document::load_mem(&output.bytes).unwrap().get_pages().len(), 1);
        }
    }

    #[test]
    fn test_empty_selection_is_rejected() {
        let state = document(1);
        let request = ExportRequest::new("x").with_pages([PageId::new("missing")]);
        assert!(matches!(export(&state, &request), Err(ExportError::NoPages)));
        assert!(matches!(export(&state, &ExportRequest::new("x")), Err(ExportError::NoPages)));
    }

    #[test]
    fn test_invalid_options_abort_export() {
        let state = document(1);
        let options = RenderOptions::default().with_scale(f64::NAN);
        let result = export_document_blocking(&state, &ExportRequest::all_pages(&state), &options, &DataUrlSource::new());
        assert!(matches!(result, Err(ExportError::Render(_))));
    }

    #[test]
    fn test_job_success_auto_dismisses() {
        let mut job = ExportJob::new();
        let t0 = Instant::now();
        assert!(job.start());
        assert!(!job.start());
        assert_eq!(job.finish(Ok(7), t0), Some(7));
        assert_eq!(job.status(), &ExportStatus::Success);

        job.tick(t0 + Duration::from_millis(1000));
        assert_eq!(job.status(), &ExportStatus::Success);
        job.tick(t0 + SUCCESS_DISMISS_DELAY);
        assert_eq!(job.status(), &ExportStatus::Idle);
    }

    #[test]
    fn test_job_error_persists_until_dismissed() {
        let mut job = ExportJob::new();
        let t0 = Instant::now();
        job.start();
        assert_eq!(job.finish::<()>(Err(ExportError::NoPages), t0), None);
        job.tick(t0 + Duration::from_secs(10));
        assert_eq!(job.status(), &ExportStatus::Error("No pages selected for export".to_string()));
        job.dismiss();
        assert_eq!(job.status(), &ExportStatus::Idle);
    }
}

// Report rendering: layout + PDF writer + email bodies.
// PDF output is CPU-bound; async callers go through `render_pdf_blocking`.

pub mod font_metrics;
pub mod html;
pub mod layout;
pub mod pdf;

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::scoring::ReportDocument;

pub use pdf::LopdfRenderer;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("layout produced no pages")]
    EmptyLayout,

    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("render task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Turns a composed report into document bytes. Carried in `AppState` as
/// `Arc<dyn ReportRenderer>` so the PDF backend can be swapped without touching handlers.
pub trait ReportRenderer: Send + Sync {
    fn render_pdf(&self, doc: &ReportDocument) -> Result<Vec<u8>, RenderError>;
}

/// Runs the renderer on the blocking pool.
pub async fn render_pdf_blocking(
    renderer: Arc<dyn ReportRenderer>,
    doc: ReportDocument,
) -> Result<Vec<u8>, RenderError> {
    tokio::task::spawn_blocking(move || renderer.render_pdf(&doc)).await?
}

/// `assessment_report_<id>.pdf` for stored assessments, `financial_health_report.pdf` otherwise.
pub fn pdf_filename(assessment_id: Option<Uuid>) -> String {
    match assessment_id {
        Some(id) => format!("assessment_report_{id}.pdf"),
        None => "financial_health_report.pdf".to_string(),
    }
}

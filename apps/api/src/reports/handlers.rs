use axum::{extract::State, response::Response, Json};

use crate::errors::AppError;
use crate::render::render_pdf_blocking;
use crate::reports::pdf_attachment;
use crate::reports::source::ReportSource;
use crate::scoring::ReportDocument;
use crate::state::AppState;

/// POST /api/v1/reports
pub async fn handle_create_report(
    State(state): State<AppState>,
    Json(source): Json<ReportSource>,
) -> Result<Json<ReportDocument>, AppError> {
    let resolved = source.resolve(&state).await?;
    Ok(Json(resolved.compose()))
}

/// POST /api/v1/reports/pdf
pub async fn handle_create_report_pdf(
    State(state): State<AppState>,
    Json(source): Json<ReportSource>,
) -> Result<Response, AppError> {
    let resolved = source.resolve(&state).await?;
    let bytes = render_pdf_blocking(state.renderer.clone(), resolved.compose()).await?;
    Ok(pdf_attachment(bytes, &resolved.pdf_filename()))
}

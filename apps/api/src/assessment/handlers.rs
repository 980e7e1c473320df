//! Axum route handlers for progress, completed assessments and their reports.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::assessment::{
    delete_completed, find_completed, latest_completed, save_completed, store, AssessmentRecord,
    CompletedAssessment, SaveOutcome, StorageLocation,
};
use crate::catalog::store::current_catalog;
use crate::catalog::Question;
use crate::errors::AppError;
use crate::models::assessment::ProgressRow;
use crate::render::{pdf_filename, render_pdf_blocking};
use crate::reports::pdf_attachment;
use crate::scoring::{compose, AnswerSet, ReportDocument};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdQuery {
    #[serde(alias = "user_id")]
    pub user_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub focus: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressInput {
    pub user_id: Uuid,
    #[serde(default)]
    pub current_index: i32,
    #[serde(default)]
    pub answers: AnswerSet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitInput {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub answers: AnswerSet,
    #[serde(default)]
    pub questions: Option<Vec<Question>>,
}

/// PUT /api/v1/progress
pub async fn handle_save_progress(
    State(state): State<AppState>,
    Json(input): Json<ProgressInput>,
) -> Result<Json<ProgressRow>, AppError> {
    if input.current_index < 0 {
        return Err(AppError::Validation(
            "currentIndex cannot be negative".to_string(),
        ));
    }
    let row =
        store::upsert_progress(&state.db, input.user_id, input.current_index, &input.answers)
            .await?;
    Ok(Json(row))
}

/// GET /api/v1/progress?userId=
pub async fn handle_get_progress(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ProgressRow>, AppError> {
    let row = store::load_progress(&state.db, params.user_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No saved progress for user {}", params.user_id))
        })?;
    Ok(Json(row))
}

/// DELETE /api/v1/progress?userId=
pub async fn handle_clear_progress(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    store::clear_progress(&state.db, params.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/assessments
///
/// 201 when stored remotely, 202 when spooled locally, 503 when neither store
/// accepted it. The body is the save outcome in every case.
pub async fn handle_submit_assessment(
    State(state): State<AppState>,
    Json(input): Json<SubmitInput>,
) -> Result<(StatusCode, Json<SaveOutcome>), AppError> {
    if input.answers.is_empty() {
        return Err(AppError::Validation(
            "a completed assessment needs at least one answer".to_string(),
        ));
    }
    let questions = match input.questions {
        Some(questions) => questions,
        None => current_catalog(&state.db).await.into_questions(),
    };

    let assessment = CompletedAssessment::new(input.user_id, input.answers, questions);
    let outcome = save_completed(&state.db, &state.spool, assessment).await;

    let status = match (outcome.persisted, outcome.location) {
        (false, _) => StatusCode::SERVICE_UNAVAILABLE,
        (true, StorageLocation::Remote) => StatusCode::CREATED,
        (true, StorageLocation::Local) => StatusCode::ACCEPTED,
    };
    Ok((status, Json(outcome)))
}

/// GET /api/v1/assessments/latest?userId=
pub async fn handle_latest_assessment(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<AssessmentRecord>, AppError> {
    let record = latest_completed(&state.db, &state.spool, params.user_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No assessment found for user {}", params.user_id))
        })?;
    Ok(Json(record))
}

/// GET /api/v1/assessments/:id
pub async fn handle_get_assessment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AssessmentRecord>, AppError> {
    Ok(Json(fetch_assessment(&state, id).await?))
}

/// DELETE /api/v1/assessments/:id
pub async fn handle_delete_assessment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !delete_completed(&state.db, &state.spool, id).await? {
        return Err(AppError::NotFound(format!("Assessment {id} not found")));
    }
    tracing::info!("Deleted assessment {id}");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/assessments/:id/report
pub async fn handle_assessment_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ReportQuery>,
) -> Result<Json<ReportDocument>, AppError> {
    let record = fetch_assessment(&state, id).await?;
    Ok(Json(report_for(&state, &record, params.focus)))
}

/// GET /api/v1/assessments/:id/report.pdf
pub async fn handle_assessment_report_pdf(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ReportQuery>,
) -> Result<Response, AppError> {
    let record = fetch_assessment(&state, id).await?;
    let doc = report_for(&state, &record, params.focus);
    let bytes = render_pdf_blocking(state.renderer.clone(), doc).await?;
    Ok(pdf_attachment(bytes, &pdf_filename(Some(id))))
}

async fn fetch_assessment(state: &AppState, id: Uuid) -> Result<AssessmentRecord, AppError> {
    find_completed(&state.db, &state.spool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Assessment {id} not found")))
}

fn report_for(state: &AppState, record: &AssessmentRecord, focus: Option<usize>) -> ReportDocument {
    compose(
        &record.catalog(),
        &record.answers,
        None,
        focus.unwrap_or(state.config.focus_area_count),
    )
}

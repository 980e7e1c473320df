//! Axum route handlers for question administration.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::store::{self, CatalogSource, CreateOutcome};
use crate::catalog::{Question, QuestionId};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct QuestionsQuery {
    #[serde(default)]
    pub shuffle: bool,
}

#[derive(Debug, Serialize)]
pub struct QuestionsResponse {
    pub questions: Vec<Question>,
    pub source: CatalogSource,
}

#[derive(Debug, Deserialize)]
pub struct QuestionInput {
    #[serde(default)]
    pub id: Option<QuestionId>,
    #[serde(alias = "copy")]
    pub text: String,
    pub pillar: String,
}

#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub question: Question,
}

impl QuestionInput {
    /// Trimmed `(text, pillar)`; both must be non-empty.
    fn validated(&self) -> Result<(&str, &str), AppError> {
        let text = self.text.trim();
        let pillar = self.pillar.trim();
        if text.is_empty() {
            return Err(AppError::Validation("question text cannot be empty".to_string()));
        }
        if pillar.is_empty() {
            return Err(AppError::Validation("pillar cannot be empty".to_string()));
        }
        Ok((text, pillar))
    }
}

/// GET /api/v1/questions
pub async fn handle_list_questions(
    State(state): State<AppState>,
    Query(params): Query<QuestionsQuery>,
) -> Result<Json<QuestionsResponse>, AppError> {
    let (catalog, source) = store::load_catalog(&state.db).await?;
    let catalog = if params.shuffle {
        catalog.shuffled(&mut rand::thread_rng())
    } else {
        catalog
    };
    Ok(Json(QuestionsResponse {
        questions: catalog.into_questions(),
        source,
    }))
}

/// POST /api/v1/questions
pub async fn handle_create_question(
    State(state): State<AppState>,
    Json(input): Json<QuestionInput>,
) -> Result<(StatusCode, Json<QuestionResponse>), AppError> {
    let (text, pillar) = input.validated()?;
    match store::create_question(&state.db, input.id.clone(), text, pillar).await? {
        CreateOutcome::Created(question) => {
            Ok((StatusCode::CREATED, Json(QuestionResponse { question })))
        }
        CreateOutcome::DuplicateId(id) => {
            Err(AppError::Conflict(format!("Question {id} already exists")))
        }
    }
}

/// PUT /api/v1/questions/:id
pub async fn handle_update_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<QuestionInput>,
) -> Result<Json<QuestionResponse>, AppError> {
    let (text, pillar) = input.validated()?;
    let id = QuestionId::new(id);
    let question = store::update_question(&state.db, &id, text, pillar)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Question {id} not found")))?;
    Ok(Json(QuestionResponse { question }))
}

/// DELETE /api/v1/questions/:id
pub async fn handle_delete_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = QuestionId::new(id);
    if store::delete_question(&state.db, &id).await? {
        info!("Deleted question {id}");
    }
    Ok(StatusCode::NO_CONTENT)
}

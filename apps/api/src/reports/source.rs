//! Where a report's answers come from: a stored assessment or an inline answer set.

use serde::Deserialize;
use uuid::Uuid;

use crate::assessment::find_completed;
use crate::catalog::store::current_catalog;
use crate::catalog::{Question, QuestionCatalog};
use crate::errors::AppError;
use crate::render::pdf_filename;
use crate::scoring::{compose, AnswerSet, Profile, ReportDocument};
use crate::state::AppState;

/// Request fragment shared by every endpoint that produces a report.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSource {
    #[serde(default)]
    pub assessment_id: Option<Uuid>,
    #[serde(default)]
    pub answers: Option<AnswerSet>,
    /// Catalog the inline answers were given against. Defaults to the current catalog.
    #[serde(default)]
    pub questions: Option<Vec<Question>>,
    #[serde(default)]
    pub profile: Option<Profile>,
    /// Number of focus areas to recommend.
    #[serde(default)]
    pub focus: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ResolvedReport {
    pub catalog: QuestionCatalog,
    pub answers: AnswerSet,
    pub profile: Option<Profile>,
    pub assessment_id: Option<Uuid>,
    pub focus: usize,
}

impl ResolvedReport {
    pub fn compose(&self) -> ReportDocument {
        compose(
            &self.catalog,
            &self.answers,
            self.profile.as_ref(),
            self.focus,
        )
    }

    pub fn pdf_filename(&self) -> String {
        pdf_filename(self.assessment_id)
    }
}

impl ReportSource {
    pub async fn resolve(self, state: &AppState) -> Result<ResolvedReport, AppError> {
        let focus = self.focus.unwrap_or(state.config.focus_area_count);

        match (self.assessment_id, self.answers) {
            (Some(_), Some(_)) => Err(AppError::Validation(
                "provide either assessmentId or answers, not both".to_string(),
            )),
            (None, None) => Err(AppError::Validation(
                "either assessmentId or answers is required".to_string(),
            )),
            (Some(id), None) => {
                let record = find_completed(&state.db, &state.spool, id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Assessment {id} not found")))?;
                Ok(ResolvedReport {
                    catalog: record.catalog(),
                    answers: record.answers,
                    profile: self.profile,
                    assessment_id: Some(id),
                    focus,
                })
            }
            (None, Some(answers)) => {
                let catalog = match self.questions {
                    Some(questions) => QuestionCatalog::new(questions),
                    None => current_catalog(&state.db).await,
                };
                Ok(ResolvedReport {
                    catalog,
                    answers,
                    profile: self.profile,
                    assessment_id: None,
                    focus,
                })
            }
        }
    }
}

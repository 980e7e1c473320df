//! Assessment lifecycle: in-progress answers, completed submissions and their reports.
//!
//! Saving a completed assessment never silently loses answers. The caller gets an
//! explicit [`SaveOutcome`] saying where the record ended up and why.

pub mod handlers;
pub mod spool;
pub mod store;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::assessment::spool::{LocalSpool, SpooledAssessment};
use crate::catalog::{Question, QuestionCatalog};
use crate::errors::AppError;
use crate::models::assessment::AssessmentRow;
use crate::scoring::AnswerSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageLocation {
    Remote,
    Local,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub persisted: bool,
    pub location: StorageLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CompletedAssessment {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub answers: AnswerSet,
    pub questions: Vec<Question>,
    pub completed_at: DateTime<Utc>,
}

impl CompletedAssessment {
    pub fn new(user_id: Option<Uuid>, answers: AnswerSet, questions: Vec<Question>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            answers,
            questions,
            completed_at: Utc::now(),
        }
    }

    fn into_spooled(self) -> SpooledAssessment {
        SpooledAssessment {
            id: self.id,
            user_id: self.user_id,
            answers: self.answers,
            questions: self.questions,
            completed_at: self.completed_at,
        }
    }
}

/// A completed assessment read back from either store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRecord {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub answers: AnswerSet,
    pub questions: Vec<Question>,
    pub completed_at: DateTime<Utc>,
    pub location: StorageLocation,
}

impl AssessmentRecord {
    pub fn catalog(&self) -> QuestionCatalog {
        QuestionCatalog::new(self.questions.clone())
    }
}

impl From<AssessmentRow> for AssessmentRecord {
    fn from(row: AssessmentRow) -> Self {
        Self {
            id: row.id,
            user_id: Some(row.user_id),
            answers: row.answers.0,
            questions: row.questions.0,
            completed_at: row.completed_at,
            location: StorageLocation::Remote,
        }
    }
}

impl From<SpooledAssessment> for AssessmentRecord {
    fn from(record: SpooledAssessment) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            answers: record.answers,
            questions: record.questions,
            completed_at: record.completed_at,
            location: StorageLocation::Local,
        }
    }
}

/// Looks an assessment up in the database, then in the local spool.
///
/// A database error is only returned when the spool has no record either, so ids
/// handed out for spooled saves stay readable while the database is down.
pub async fn find_completed(
    pool: &PgPool,
    spool: &LocalSpool,
    id: Uuid,
) -> Result<Option<AssessmentRecord>, AppError> {
    match store::find_assessment(pool, id).await {
        Ok(Some(row)) => Ok(Some(row.into())),
        remote => match spool.find(id).await? {
            Some(record) => Ok(Some(record.into())),
            None => remote.map(|_| None).map_err(AppError::from),
        },
    }
}

/// Most recent assessment for a user across both stores.
pub async fn latest_completed(
    pool: &PgPool,
    spool: &LocalSpool,
    user_id: Uuid,
) -> Result<Option<AssessmentRecord>, AppError> {
    let remote = store::latest_for_user(pool, user_id).await;
    let local = spool.latest_for_user(user_id).await?;

    match (remote, local) {
        (Ok(Some(row)), Some(spooled)) if spooled.completed_at > row.completed_at => {
            Ok(Some(spooled.into()))
        }
        (Ok(Some(row)), _) => Ok(Some(row.into())),
        (_, Some(spooled)) => Ok(Some(spooled.into())),
        (Ok(None), None) => Ok(None),
        (Err(e), None) => Err(e.into()),
    }
}

/// Deletes an assessment from whichever store holds it. Returns whether one existed.
pub async fn delete_completed(pool: &PgPool, spool: &LocalSpool, id: Uuid) -> Result<bool, AppError> {
    let removed_local = spool.remove(id).await?;
    match store::delete_assessment(pool, id).await {
        Ok(removed_remote) => Ok(removed_remote || removed_local),
        Err(_) if removed_local => Ok(true),
        Err(e) => Err(e.into()),
    }
}

/// Persists a completed assessment.
///
/// Anonymous submissions go straight to the local spool. Identified ones go to the
/// database, and on failure to the spool with the database error carried in the
/// outcome. `persisted` is false only when both stores refused the record.
pub async fn save_completed(
    pool: &PgPool,
    spool: &LocalSpool,
    assessment: CompletedAssessment,
) -> SaveOutcome {
    let Some(user_id) = assessment.user_id else {
        return fallback_to_spool(spool, assessment, None).await;
    };

    let inserted = store::insert_assessment(
        pool,
        assessment.id,
        user_id,
        &assessment.answers,
        &assessment.questions,
        assessment.completed_at,
    )
    .await;

    match inserted {
        Ok(row) => {
            info!("Stored assessment {} for user {user_id}", row.id);
            if let Err(e) = store::clear_progress(pool, user_id).await {
                warn!("Could not clear progress for user {user_id}: {e}");
            }
            SaveOutcome {
                persisted: true,
                location: StorageLocation::Remote,
                assessment_id: Some(row.id),
                error: None,
            }
        }
        Err(e) => {
            warn!("Remote save failed for user {user_id}, falling back to local spool: {e}");
            fallback_to_spool(spool, assessment, Some(e.to_string())).await
        }
    }
}

async fn fallback_to_spool(
    spool: &LocalSpool,
    assessment: CompletedAssessment,
    remote_error: Option<String>,
) -> SaveOutcome {
    let id = assessment.id;
    match spool.write(&assessment.into_spooled()).await {
        Ok(_) => SaveOutcome {
            persisted: true,
            location: StorageLocation::Local,
            assessment_id: Some(id),
            error: remote_error,
        },
        Err(e) => {
            error!("Assessment {id} could not be stored anywhere: {e}");
            let message = match remote_error {
                Some(remote) => format!("{remote}; local spool: {e}"),
                None => format!("local spool: {e}"),
            };
            SaveOutcome {
                persisted: false,
                location: StorageLocation::Local,
                assessment_id: None,
                error: Some(message),
            }
        }
    }
}

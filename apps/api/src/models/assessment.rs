use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::catalog::Question;
use crate::scoring::AnswerSet;

/// A completed assessment. Immutable once written; only administrative deletion.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub answers: Json<AnswerSet>,
    /// Catalog snapshot the answers were given against.
    pub questions: Json<Vec<Question>>,
    pub completed_at: DateTime<Utc>,
}

/// In-progress answers, one row per user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRow {
    pub user_id: Uuid,
    pub current_index: i32,
    pub answers: Json<AnswerSet>,
    pub updated_at: DateTime<Utc>,
}

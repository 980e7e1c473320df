use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::catalog::Question;

/// Administrator-managed catalog row. `position` fixes catalog order.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuestionRow {
    pub id: String,
    pub copy: String,
    pub pillar: String,
    pub position: i32,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Question::new(row.id, row.copy, row.pillar)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::scoring::ReportDocument;

/// A shareable-link snapshot: the report as composed at share time plus its archived PDF.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReportShareRow {
    pub token: String,
    pub assessment_id: Option<Uuid>,
    pub report: Json<ReportDocument>,
    pub s3_key: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ReportShareRow {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

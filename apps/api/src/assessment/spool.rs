//! Local fallback storage for completed assessments.
//!
//! One JSON file per assessment. Files are written to a temporary name and renamed
//! into place so a crash never leaves a half-written record behind.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::catalog::Question;
use crate::scoring::AnswerSet;

#[derive(Debug, Error)]
pub enum SpoolError {
    #[error("spool I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not serialize assessment: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A completed assessment as written to the spool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpooledAssessment {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub answers: AnswerSet,
    pub questions: Vec<Question>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct LocalSpool {
    dir: PathBuf,
}

impl LocalSpool {
    pub fn new(dir: &str) -> Self {
        Self {
            dir: PathBuf::from(dir),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(record: &SpooledAssessment) -> String {
        format!(
            "{}-{}.json",
            record.completed_at.format("%Y%m%dT%H%M%SZ"),
            record.id
        )
    }

    /// Writes the record and returns its final path.
    pub async fn write(&self, record: &SpooledAssessment) -> Result<PathBuf, SpoolError> {
        let body = serde_json::to_vec_pretty(record)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(Self::file_name(record));
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &body).await?;
        tokio::fs::rename(&tmp, &path).await?;

        info!("Spooled assessment {} to {}", record.id, path.display());
        Ok(path)
    }

    /// Finds the spooled record with this id, if any.
    pub async fn find(&self, id: Uuid) -> Result<Option<SpooledAssessment>, SpoolError> {
        match self.path_of(id).await? {
            Some(path) => {
                let raw = tokio::fs::read(&path).await?;
                Ok(Some(serde_json::from_slice(&raw)?))
            }
            None => Ok(None),
        }
    }

    /// Most recent spooled record for a user.
    pub async fn latest_for_user(&self, user_id: Uuid) -> Result<Option<SpooledAssessment>, SpoolError> {
        let records = self.read_all().await?;
        Ok(records
            .into_iter()
            .filter(|r| r.user_id == Some(user_id))
            .max_by_key(|r| r.completed_at))
    }

    /// Deletes the record with this id. Returns whether one existed.
    pub async fn remove(&self, id: Uuid) -> Result<bool, SpoolError> {
        match self.path_of(id).await? {
            Some(path) => {
                tokio::fs::remove_file(&path).await?;
                info!("Removed spooled assessment {id}");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn path_of(&self, id: Uuid) -> Result<Option<PathBuf>, SpoolError> {
        let suffix = format!("-{id}.json");
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy().ends_with(&suffix) {
                return Ok(Some(entry.path()));
            }
        }
        Ok(None)
    }

    /// Reads every spooled record, oldest first.
    pub async fn read_all(&self) -> Result<Vec<SpooledAssessment>, SpoolError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut records = Vec::with_capacity(paths.len());
        for path in paths {
            let raw = tokio::fs::read(&path).await?;
            records.push(serde_json::from_slice(&raw)?);
        }
        Ok(records)
    }
}

//! Database-backed catalog overrides.
//!
//! The `questions` table starts empty and the built-in catalog is served. The first
//! administrative write seeds the table with the built-in questions so edits apply
//! on top of the full questionnaire rather than replacing it.

use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};

use crate::catalog::{Question, QuestionCatalog, QuestionId};
use crate::models::question::QuestionRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSource {
    Database,
    BuiltIn,
}

/// Current catalog snapshot: database rows in `position` order, or the built-in list.
pub async fn load_catalog(pool: &PgPool) -> Result<(QuestionCatalog, CatalogSource), sqlx::Error> {
    let rows = sqlx::query_as::<_, QuestionRow>(
        "SELECT id, copy, pillar, position FROM questions ORDER BY position, id",
    )
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        return Ok((QuestionCatalog::built_in(), CatalogSource::BuiltIn));
    }
    let questions = rows.into_iter().map(Question::from).collect();
    Ok((QuestionCatalog::new(questions), CatalogSource::Database))
}

/// Catalog for scoring. A database outage degrades to the built-in questions.
pub async fn current_catalog(pool: &PgPool) -> QuestionCatalog {
    match load_catalog(pool).await {
        Ok((catalog, _)) => catalog,
        Err(e) => {
            warn!("Could not load question catalog, using built-in questions: {e}");
            QuestionCatalog::built_in()
        }
    }
}

/// Serialises catalog writers for the rest of the transaction. Plain reads are not
/// blocked by this lock mode.
const LOCK_QUESTIONS: &str = "LOCK TABLE questions IN SHARE ROW EXCLUSIVE MODE";

/// Locks the table, then seeds it with the built-in questions if it is still empty.
async fn lock_and_seed(tx: &mut Transaction<'_, Postgres>) -> Result<(), sqlx::Error> {
    sqlx::query(LOCK_QUESTIONS).execute(&mut **tx).await?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
        .fetch_one(&mut **tx)
        .await?;
    if count > 0 {
        return Ok(());
    }

    let built_in = QuestionCatalog::built_in();
    for (position, q) in built_in.questions().iter().enumerate() {
        sqlx::query("INSERT INTO questions (id, copy, pillar, position) VALUES ($1, $2, $3, $4)")
            .bind(q.id.as_str())
            .bind(&q.text)
            .bind(&q.pillar)
            .bind(position as i32)
            .execute(&mut **tx)
            .await?;
    }
    info!("Seeded questions table with {} built-in questions", built_in.len());
    Ok(())
}

/// Next integer id after the largest numeric id. Non-numeric ids (`"1-3"`) are skipped.
pub fn next_numeric_id<'a>(ids: impl IntoIterator<Item = &'a QuestionId>) -> QuestionId {
    let max = ids.into_iter().filter_map(QuestionId::as_number).max();
    QuestionId::from(max.map_or(1, |m| m + 1))
}

pub enum CreateOutcome {
    Created(Question),
    DuplicateId(QuestionId),
}

pub async fn create_question(
    pool: &PgPool,
    id: Option<QuestionId>,
    text: &str,
    pillar: &str,
) -> Result<CreateOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;
    lock_and_seed(&mut tx).await?;

    let existing: Vec<String> = sqlx::query_scalar("SELECT id FROM questions")
        .fetch_all(&mut *tx)
        .await?;
    let existing: Vec<QuestionId> = existing.into_iter().map(QuestionId::new).collect();

    let id = match id {
        Some(id) if existing.contains(&id) => return Ok(CreateOutcome::DuplicateId(id)),
        Some(id) => id,
        None => next_numeric_id(&existing),
    };

    let position: i32 = sqlx::query_scalar("SELECT COALESCE(MAX(position), -1) + 1 FROM questions")
        .fetch_one(&mut *tx)
        .await?;

    let inserted =
        sqlx::query("INSERT INTO questions (id, copy, pillar, position) VALUES ($1, $2, $3, $4)")
            .bind(id.as_str())
            .bind(text)
            .bind(pillar)
            .bind(position)
            .execute(&mut *tx)
            .await;
    if let Err(e) = inserted {
        return duplicate_or_error(e, id);
    }
    tx.commit().await?;

    info!("Created question {id} in pillar '{pillar}'");
    Ok(CreateOutcome::Created(Question {
        id,
        text: text.to_string(),
        pillar: pillar.to_string(),
    }))
}

/// A unique violation on insert means the id was taken: 409, not a database failure.
fn duplicate_or_error(err: sqlx::Error, id: QuestionId) -> Result<CreateOutcome, sqlx::Error> {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            Ok(CreateOutcome::DuplicateId(id))
        }
        _ => Err(err),
    }
}

/// Returns `None` when no question has this id.
pub async fn update_question(
    pool: &PgPool,
    id: &QuestionId,
    text: &str,
    pillar: &str,
) -> Result<Option<Question>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    lock_and_seed(&mut tx).await?;

    let updated = sqlx::query_as::<_, QuestionRow>(
        "UPDATE questions SET copy = $2, pillar = $3 WHERE id = $1 RETURNING id, copy, pillar, position",
    )
    .bind(id.as_str())
    .bind(text)
    .bind(pillar)
    .fetch_optional(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(updated.map(Question::from))
}

/// Idempotent: deleting an unknown id is not an error.
pub async fn delete_question(pool: &PgPool, id: &QuestionId) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;
    lock_and_seed(&mut tx).await?;

    let result = sqlx::query("DELETE FROM questions WHERE id = $1")
        .bind(id.as_str())
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(result.rows_affected() > 0)
}

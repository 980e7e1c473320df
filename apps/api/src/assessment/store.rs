use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::catalog::Question;
use crate::models::assessment::{AssessmentRow, ProgressRow};
use crate::scoring::AnswerSet;

pub async fn insert_assessment(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    answers: &AnswerSet,
    questions: &[Question],
    completed_at: DateTime<Utc>,
) -> Result<AssessmentRow, sqlx::Error> {
    sqlx::query_as::<_, AssessmentRow>(
        r#"
        INSERT INTO assessments (id, user_id, answers, questions, completed_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, answers, questions, completed_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(Json(answers))
    .bind(Json(questions))
    .bind(completed_at)
    .fetch_one(pool)
    .await
}

pub async fn latest_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<AssessmentRow>, sqlx::Error> {
    sqlx::query_as::<_, AssessmentRow>(
        r#"
        SELECT id, user_id, answers, questions, completed_at
        FROM assessments
        WHERE user_id = $1
        ORDER BY completed_at DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_assessment(pool: &PgPool, id: Uuid) -> Result<Option<AssessmentRow>, sqlx::Error> {
    sqlx::query_as::<_, AssessmentRow>(
        "SELECT id, user_id, answers, questions, completed_at FROM assessments WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_assessment(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM assessments WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn upsert_progress(
    pool: &PgPool,
    user_id: Uuid,
    current_index: i32,
    answers: &AnswerSet,
) -> Result<ProgressRow, sqlx::Error> {
    sqlx::query_as::<_, ProgressRow>(
        r#"
        INSERT INTO assessment_progress (user_id, current_index, answers, updated_at)
        VALUES ($1, $2, $3, NOW())
        ON CONFLICT (user_id) DO UPDATE
        SET current_index = EXCLUDED.current_index,
            answers = EXCLUDED.answers,
            updated_at = EXCLUDED.updated_at
        RETURNING user_id, current_index, answers, updated_at
        "#,
    )
    .bind(user_id)
    .bind(current_index)
    .bind(Json(answers))
    .fetch_one(pool)
    .await
}

pub async fn load_progress(pool: &PgPool, user_id: Uuid) -> Result<Option<ProgressRow>, sqlx::Error> {
    sqlx::query_as::<_, ProgressRow>(
        "SELECT user_id, current_index, answers, updated_at FROM assessment_progress WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn clear_progress(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM assessment_progress WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

//! Shareable report links.
//!
//! A share freezes the report as composed at share time. The snapshot lives in
//! `report_shares` and the rendered PDF is archived in S3 under
//! `shared-reports/<token>.pdf`.

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::share::ReportShareRow;
use crate::scoring::ReportDocument;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLink {
    pub token: String,
    pub share_url: String,
    pub expires_at: DateTime<Utc>,
}

pub struct NewShare<'a> {
    pub report: &'a ReportDocument,
    pub assessment_id: Option<Uuid>,
    pub pdf: Vec<u8>,
}

pub fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Tokens are 32 lowercase hex characters.
pub fn is_valid_token(token: &str) -> bool {
    token.len() == 32
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

pub fn share_url(public_base_url: &str, token: &str) -> String {
    format!("{}/share/{token}", public_base_url.trim_end_matches('/'))
}

pub fn s3_key(token: &str) -> String {
    format!("shared-reports/{token}.pdf")
}

pub async fn create_share(
    pool: &PgPool,
    s3: &S3Client,
    s3_bucket: &str,
    public_base_url: &str,
    ttl_days: i64,
    share: NewShare<'_>,
) -> Result<ShareLink, AppError> {
    let token = new_token();
    let key = s3_key(&token);

    s3.put_object()
        .bucket(s3_bucket)
        .key(&key)
        .body(ByteStream::from(share.pdf))
        .content_type("application/pdf")
        .send()
        .await
        .map_err(|e| AppError::S3(format!("upload of {key} failed: {e}")))?;

    info!("Archived shared report PDF to s3://{s3_bucket}/{key}");

    let created_at = Utc::now();
    let expires_at = created_at + Duration::days(ttl_days);
    sqlx::query(
        r#"
        INSERT INTO report_shares (token, assessment_id, report, s3_key, created_at, expires_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(&token)
    .bind(share.assessment_id)
    .bind(Json(share.report))
    .bind(&key)
    .bind(created_at)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(ShareLink {
        share_url: share_url(public_base_url, &token),
        token,
        expires_at,
    })
}

pub async fn find_share(pool: &PgPool, token: &str) -> Result<Option<ReportShareRow>, sqlx::Error> {
    sqlx::query_as::<_, ReportShareRow>(
        r#"
        SELECT token, assessment_id, report, s3_key, created_at, expires_at
        FROM report_shares
        WHERE token = $1
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_pdf(s3: &S3Client, s3_bucket: &str, key: &str) -> Result<Bytes, AppError> {
    let object = s3
        .get_object()
        .bucket(s3_bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("download of {key} failed: {e}")))?;
    let data = object
        .body
        .collect()
        .await
        .map_err(|e| AppError::S3(format!("reading {key} failed: {e}")))?;
    Ok(data.into_bytes())
}

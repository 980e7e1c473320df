use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::assessment::spool::LocalSpool;
use crate::config::Config;
use crate::render::ReportRenderer;
use crate::share::mailer::Mailer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    pub config: Config,
    /// PDF backend. Default: LopdfRenderer.
    pub renderer: Arc<dyn ReportRenderer>,
    /// SmtpMailer when SMTP_HOST is set, LogMailer otherwise.
    pub mailer: Arc<dyn Mailer>,
    /// Local fallback for completed assessments the database could not accept.
    pub spool: LocalSpool,
}

mod assessment;
mod catalog;
mod config;
mod db;
mod errors;
mod models;
mod render;
mod reports;
mod routes;
mod scoring;
mod share;
mod state;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::assessment::spool::LocalSpool;
use crate::config::Config;
use crate::db::create_pool;
use crate::render::LopdfRenderer;
use crate::routes::build_router;
use crate::share::mailer::{LogMailer, Mailer, SmtpMailer};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Financial Health API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    let mailer = build_mailer(&config);
    let spool = LocalSpool::new(&config.local_spool_dir);
    info!("Local spool directory: {}", spool.dir().display());

    let state = AppState {
        db,
        s3,
        config: config.clone(),
        renderer: Arc::new(LopdfRenderer::new()),
        mailer,
        spool,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// SMTP delivery when configured; otherwise shared reports are only logged.
fn build_mailer(config: &Config) -> Arc<dyn Mailer> {
    let Some(smtp) = &config.smtp else {
        info!("SMTP_HOST not set; emailed reports will be logged, not sent");
        return Arc::new(LogMailer);
    };
    match SmtpMailer::new(smtp, &config.mail_from) {
        Ok(mailer) => {
            info!("SMTP mailer initialized ({}:{})", smtp.host, smtp.port);
            Arc::new(mailer)
        }
        Err(e) => {
            warn!("SMTP mailer unavailable, falling back to log-only delivery: {e}");
            Arc::new(LogMailer)
        }
    }
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "finhealth-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}

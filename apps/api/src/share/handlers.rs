//! Axum route handlers for emailing reports and shareable links.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::share::ReportShareRow;
use crate::render::html::{render_html, render_text, EmailIntro};
use crate::render::layout::REPORT_TITLE;
use crate::render::{pdf_filename, render_pdf_blocking};
use crate::reports::pdf_attachment;
use crate::reports::source::ReportSource;
use crate::scoring::ReportDocument;
use crate::share::links::{self, NewShare, ShareLink};
use crate::share::mailer::{parse_recipient, OutgoingReport, PdfAttachment};
use crate::state::AppState;

const DEFAULT_SENDER: &str = "A colleague";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailShareRequest {
    #[serde(flatten)]
    pub source: ReportSource,
    pub recipient_email: String,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "default_include_pdf")]
    pub include_pdf: bool,
}

fn default_include_pdf() -> bool {
    true
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailShareResponse {
    pub delivered: bool,
    pub recipient: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
}

/// POST /api/v1/share/email
pub async fn handle_share_email(
    State(state): State<AppState>,
    Json(req): Json<EmailShareRequest>,
) -> Result<Json<EmailShareResponse>, AppError> {
    let recipient = parse_recipient(&req.recipient_email)?;
    let resolved = req.source.resolve(&state).await?;
    let doc = resolved.compose();

    let sender_name = req
        .sender_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SENDER);
    let intro = EmailIntro {
        sender_name,
        message: req.message.as_deref(),
    };
    let html_body = render_html(&doc, &intro);
    let text_body = render_text(&doc, &intro);

    let attachment = if req.include_pdf {
        let bytes = render_pdf_blocking(state.renderer.clone(), doc).await?;
        Some(PdfAttachment {
            filename: resolved.pdf_filename(),
            bytes,
        })
    } else {
        None
    };
    let attachment_name = attachment.as_ref().map(|a| a.filename.clone());

    let receipt = state
        .mailer
        .send(OutgoingReport {
            recipient: recipient.clone(),
            subject: format!("{REPORT_TITLE} from {sender_name}"),
            html_body,
            text_body,
            attachment,
        })
        .await?;

    Ok(Json(EmailShareResponse {
        delivered: receipt.delivered,
        recipient: recipient.email.to_string(),
        attachment: attachment_name,
    }))
}

/// POST /api/v1/share/link
pub async fn handle_create_share_link(
    State(state): State<AppState>,
    Json(source): Json<ReportSource>,
) -> Result<(StatusCode, Json<ShareLink>), AppError> {
    let resolved = source.resolve(&state).await?;
    let doc = resolved.compose();
    let pdf = render_pdf_blocking(state.renderer.clone(), doc.clone()).await?;

    let link = links::create_share(
        &state.db,
        &state.s3,
        &state.config.s3_bucket,
        &state.config.public_base_url,
        state.config.share_link_ttl_days,
        NewShare {
            report: &doc,
            assessment_id: resolved.assessment_id,
            pdf,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(link)))
}

/// GET /api/v1/share/:token
pub async fn handle_get_shared_report(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ReportDocument>, AppError> {
    let share = active_share(&state, &token).await?;
    Ok(Json(share.report.0))
}

/// GET /api/v1/share/:token/pdf
pub async fn handle_get_shared_pdf(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    let share = active_share(&state, &token).await?;
    let bytes = links::fetch_pdf(&state.s3, &state.config.s3_bucket, &share.s3_key).await?;
    Ok(pdf_attachment(bytes.to_vec(), &pdf_filename(share.assessment_id)))
}

async fn active_share(state: &AppState, token: &str) -> Result<ReportShareRow, AppError> {
    let not_found = || AppError::NotFound(format!("Shared report {token} not found"));
    if !links::is_valid_token(token) {
        return Err(not_found());
    }
    let share = links::find_share(&state.db, token)
        .await?
        .ok_or_else(not_found)?;
    ensure_live(share, Utc::now())
}

/// Expired shares are 410 Gone rather than 404.
fn ensure_live(share: ReportShareRow, now: DateTime<Utc>) -> Result<ReportShareRow, AppError> {
    if share.is_expired(now) {
        return Err(AppError::Gone(format!(
            "Shared report {} expired at {}",
            share.token, share.expires_at
        )));
    }
    Ok(share)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::routes::build_router;
    use crate::share::mailer::{MailError, MailReceipt, Mailer};
    use crate::state::test_support::{default_test_state, test_state};

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingReport>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, report: OutgoingReport) -> Result<MailReceipt, MailError> {
            self.sent.lock().unwrap().push(report);
            Ok(MailReceipt { delivered: true })
        }
    }

    fn email_body(recipient: &str, include_pdf: bool) -> Value {
        json!({
            "recipientEmail": recipient,
            "senderName": "Dana",
            "message": "Worth a look <before> Friday",
            "includePdf": include_pdf,
            "answers": {"1": 9, "2": 2},
            "questions": [
                {"id": 1, "text": "Do you have a written business plan?", "pillar": "Business Plan"},
                {"id": 2, "copy": "Do you reconcile the bank weekly?", "pillar": "Bank/Cashflow"}
            ],
            "profile": {"organizationName": "Acme & Sons"}
        })
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_email_with_pdf_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let mailer = Arc::new(RecordingMailer::default());
        let app = build_router(test_state(dir.path().to_str().unwrap(), mailer.clone()));

        let response = app
            .oneshot(post_json("/api/v1/share/email", &email_body("owner@example.com", true)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value =
            serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "delivered": true,
                "recipient": "owner@example.com",
                "attachment": "financial_health_report.pdf"
            })
        );

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let report = &sent[0];
        assert_eq!(report.subject, "Financial Health Assessment Report from Dana");
        assert!(report.html_body.contains("Acme &amp; Sons"));
        assert!(report.html_body.contains("&lt;before&gt;"));
        let pdf = report.attachment.as_ref().unwrap();
        assert!(pdf.bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_email_without_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let mailer = Arc::new(RecordingMailer::default());
        let app = build_router(test_state(dir.path().to_str().unwrap(), mailer.clone()));

        let response = app
            .oneshot(post_json("/api/v1/share/email", &email_body("owner@example.com", false)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(mailer.sent.lock().unwrap()[0].attachment.is_none());
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_rejected_before_sending() {
        let dir = tempfile::tempdir().unwrap();
        let mailer = Arc::new(RecordingMailer::default());
        let app = build_router(test_state(dir.path().to_str().unwrap(), mailer.clone()));

        let response = app
            .oneshot(post_json("/api/v1/share/email", &email_body("nobody", true)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_log_mailer_reports_undelivered() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(default_test_state(dir.path().to_str().unwrap()));

        let response = app
            .oneshot(post_json("/api/v1/share/email", &email_body("owner@example.com", false)))
            .await
            .unwrap();
        let body: Value =
            serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
        assert_eq!(body["delivered"], json!(false));
    }

    #[test]
    fn test_expired_share_is_gone() {
        use crate::catalog::QuestionCatalog;
        use crate::scoring::{compose, AnswerSet};
        use axum::response::IntoResponse;
        use chrono::Duration;

        let now = Utc::now();
        let share = |expires_at| ReportShareRow {
            token: links::new_token(),
            assessment_id: None,
            report: sqlx::types::Json(compose(
                &QuestionCatalog::built_in(),
                &AnswerSet::new(),
                None,
                2,
            )),
            s3_key: "shared-reports/x.pdf".to_string(),
            created_at: now - Duration::days(30),
            expires_at,
        };

        assert!(ensure_live(share(now + Duration::seconds(1)), now).is_ok());
        for expires_at in [now, now - Duration::seconds(1)] {
            let err = ensure_live(share(expires_at), now).unwrap_err();
            assert!(matches!(err, AppError::Gone(_)));
            assert_eq!(err.into_response().status(), StatusCode::GONE);
        }
    }

    #[tokio::test]
    async fn test_malformed_token_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(default_test_state(dir.path().to_str().unwrap()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/share/not-a-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

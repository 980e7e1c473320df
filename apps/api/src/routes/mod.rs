pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::assessment::handlers as assessments;
use crate::catalog::handlers as questions;
use crate::reports::handlers as reports;
use crate::share::handlers as share;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Question catalog
        .route(
            "/api/v1/questions",
            get(questions::handle_list_questions).post(questions::handle_create_question),
        )
        .route(
            "/api/v1/questions/:id",
            put(questions::handle_update_question).delete(questions::handle_delete_question),
        )
        // Assessment lifecycle
        .route(
            "/api/v1/progress",
            put(assessments::handle_save_progress)
                .get(assessments::handle_get_progress)
                .delete(assessments::handle_clear_progress),
        )
        .route(
            "/api/v1/assessments",
            post(assessments::handle_submit_assessment),
        )
        .route(
            "/api/v1/assessments/latest",
            get(assessments::handle_latest_assessment),
        )
        .route(
            "/api/v1/assessments/:id",
            get(assessments::handle_get_assessment).delete(assessments::handle_delete_assessment),
        )
        .route(
            "/api/v1/assessments/:id/report",
            get(assessments::handle_assessment_report),
        )
        .route(
            "/api/v1/assessments/:id/report.pdf",
            get(assessments::handle_assessment_report_pdf),
        )
        // Ad-hoc reports
        .route("/api/v1/reports", post(reports::handle_create_report))
        .route("/api/v1/reports/pdf", post(reports::handle_create_report_pdf))
        // Sharing
        .route("/api/v1/share/email", post(share::handle_share_email))
        .route("/api/v1/share/link", post(share::handle_create_share_link))
        .route("/api/v1/share/:token", get(share::handle_get_shared_report))
        .route("/api/v1/share/:token/pdf", get(share::handle_get_shared_pdf))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::state::test_support::default_test_state;

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn inline_report() -> Value {
        json!({
            "answers": {"1": 8, "2": 6, "3": 3},
            "questions": [
                {"id": 1, "text": "Written plan?", "pillar": "Business Plan"},
                {"id": 2, "text": "Plan reviewed?", "pillar": "Business Plan"},
                {"id": 3, "text": "Cash forecast?", "pillar": "Bank/Cashflow"}
            ],
            "focus": 1
        })
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(default_test_state(dir.path().to_str().unwrap()));
        let (status, _, body) = send(
            app,
            Request::builder().uri("/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "finhealth-api");
    }

    #[tokio::test]
    async fn test_inline_report_json() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(default_test_state(dir.path().to_str().unwrap()));
        let (status, _, body) = send(app, post_json("/api/v1/reports", inline_report())).await;
        assert_eq!(status, StatusCode::OK);

        let doc: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(doc["overallScore"], json!(5.7));
        assert_eq!(doc["overallTier"], "average");
        assert_eq!(doc["answeredCount"], 3);
        assert_eq!(doc["pillars"][0]["name"], "Business Plan");
        assert_eq!(doc["pillars"][0]["averageScore"], json!(7.0));
        assert_eq!(doc["recommendations"].as_array().unwrap().len(), 1);
        assert_eq!(doc["recommendations"][0]["pillar"], "Bank/Cashflow");
    }

    #[tokio::test]
    async fn test_empty_answers_report_is_not_available() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(default_test_state(dir.path().to_str().unwrap()));
        let (status, _, body) = send(
            app,
            post_json("/api/v1/reports", json!({"answers": {}, "questions": []})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let doc: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(doc["overallScore"], "N/A");
        assert!(doc.get("overallTier").is_none());
        assert_eq!(doc["pillars"], json!([]));
    }

    #[tokio::test]
    async fn test_inline_report_pdf_download() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(default_test_state(dir.path().to_str().unwrap()));
        let (status, headers, body) =
            send(app, post_json("/api/v1/reports/pdf", inline_report())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"financial_health_report.pdf\""
        );
        assert!(body.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_report_without_source_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(default_test_state(dir.path().to_str().unwrap()));
        let (status, _, body) = send(app, post_json("/api/v1/reports", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_anonymous_submission_is_spooled() {
        let dir = tempfile::tempdir().unwrap();
        let state = default_test_state(dir.path().to_str().unwrap());
        let spool = state.spool.clone();
        let app = build_router(state);

        let mut body = inline_report();
        body.as_object_mut().unwrap().remove("focus");
        let (status, _, response) = send(app, post_json("/api/v1/assessments", body)).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let outcome: Value = serde_json::from_slice(&response).unwrap();
        assert_eq!(outcome["persisted"], true);
        assert_eq!(outcome["location"], "local");
        assert!(outcome.get("error").is_none());
        assert_eq!(spool.read_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_spooled_submission_is_readable_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(default_test_state(dir.path().to_str().unwrap()));

        let mut body = inline_report();
        body.as_object_mut().unwrap().remove("focus");
        let (status, _, response) = send(app.clone(), post_json("/api/v1/assessments", body)).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let outcome: Value = serde_json::from_slice(&response).unwrap();
        let id = outcome["assessmentId"].as_str().unwrap().to_string();

        let get = |uri: String| Request::builder().uri(uri).body(Body::empty()).unwrap();

        let (status, _, record) = send(app.clone(), get(format!("/api/v1/assessments/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        let record: Value = serde_json::from_slice(&record).unwrap();
        assert_eq!(record["location"], "local");
        assert_eq!(record["answers"]["3"], json!(3.0));

        let (status, _, report) =
            send(app.clone(), get(format!("/api/v1/assessments/{id}/report?focus=1"))).await;
        assert_eq!(status, StatusCode::OK);
        let report: Value = serde_json::from_slice(&report).unwrap();
        assert_eq!(report["overallScore"], json!(5.7));
        assert_eq!(report["recommendations"][0]["pillar"], "Bank/Cashflow");

        let (status, headers, pdf) =
            send(app.clone(), get(format!("/api/v1/assessments/{id}/report.pdf"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            format!("attachment; filename=\"assessment_report_{id}.pdf\"").as_str()
        );
        assert!(pdf.starts_with(b"%PDF"));

        let (status, _, report) =
            send(app, post_json("/api/v1/reports", json!({ "assessmentId": id }))).await;
        assert_eq!(status, StatusCode::OK);
        let report: Value = serde_json::from_slice(&report).unwrap();
        assert_eq!(report["answeredCount"], 3);
    }

    #[tokio::test]
    async fn test_empty_submission_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(default_test_state(dir.path().to_str().unwrap()));
        let (status, _, _) = send(
            app,
            post_json("/api/v1/assessments", json!({"answers": {}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_blank_question_text_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(default_test_state(dir.path().to_str().unwrap()));
        let (status, _, _) = send(
            app,
            post_json("/api/v1/questions", json!({"text": " ", "pillar": "Compliance"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

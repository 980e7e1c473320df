pub mod handlers;
pub mod source;

use axum::{
    http::header,
    response::{IntoResponse, Response},
};

/// Wraps rendered PDF bytes as a download.
pub fn pdf_attachment(bytes: Vec<u8>, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

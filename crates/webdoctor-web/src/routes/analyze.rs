//! Analyze route handler.
//!
//! Accepts a multipart form with an optional `file` part and an optional
//! `url` field, runs the analyzer, and maps every outcome to a structured
//! JSON body. No failure leaves this boundary as a raw error.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use webdoctor_core::analyze::model::{AnalysisRequest, UploadedFile};
use webdoctor_core::WebDoctorError;

use crate::state::AppState;

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub result: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiResult = Result<Json<AnalyzeResponse>, (StatusCode, Json<ErrorResponse>)>;

/// POST /api/analyze - Critique an uploaded image or a URL.
pub async fn analyze(State(state): State<AppState>, multipart: Multipart) -> ApiResult {
    let (url, file) = read_parts(multipart).await.map_err(error_response)?;

    let request = AnalysisRequest::from_parts(url, file).map_err(error_response)?;

    let result = state.analyzer.analyze(request).await.map_err(error_response)?;

    Ok(Json(AnalyzeResponse { result }))
}

/// Pull the `url` and `file` parts out of the multipart form.
async fn read_parts(
    mut multipart: Multipart,
) -> Result<(Option<String>, Option<UploadedFile>), WebDoctorError> {
    let mut url = None;
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| WebDoctorError::validation(format!("Malformed form data: {}", e)))?
    {
        match field.name() {
            Some("url") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| WebDoctorError::validation(format!("Malformed form data: {}", e)))?;
                url = Some(value);
            }
            Some("file") => {
                let media_type = field.content_type().map(|m| m.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| WebDoctorError::validation(format!("Malformed form data: {}", e)))?;
                file = Some(UploadedFile { bytes: bytes.to_vec(), media_type });
            }
            _ => {}
        }
    }

    Ok((url, file))
}

/// Map a failure to its stable status code and user-facing message.
///
/// Internal causes are logged here and never echoed to the client.
fn error_response(err: WebDoctorError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        WebDoctorError::Validation(_) => StatusCode::BAD_REQUEST,
        WebDoctorError::Screenshot(_)
        | WebDoctorError::Config(_)
        | WebDoctorError::Quota
        | WebDoctorError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "Analyze request failed");
    } else {
        tracing::debug!(error = %err, "Analyze request rejected");
    }

    (status, Json(ErrorResponse { error: err.user_message() }))
}

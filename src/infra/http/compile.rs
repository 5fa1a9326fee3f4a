//! Compile endpoint.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use torchio_api_types::CompileRequestEnvelope;

use crate::domain::compile::{CompileStatus, ProjectId};

use super::HttpState;
use super::error::ApiError;
use super::models::{request_from_payload, summary_to_api};

/// `POST /project/{project_id}/compile`.
///
/// The response body is always the compile envelope; the HTTP status code
/// mirrors the classification so plain load balancers can tell system
/// faults (500) and admission pushback (503) from document-level results
/// (200).
pub async fn compile(
    State(state): State<HttpState>,
    Path(project_id): Path<String>,
    Json(envelope): Json<CompileRequestEnvelope>,
) -> Response {
    let project_id = match ProjectId::parse(project_id) {
        Ok(id) => id,
        Err(err) => {
            return ApiError::bad_request("invalid project id", Some(err.to_string()))
                .into_response();
        }
    };

    if let Some(image) = envelope.compile.options.image_name.as_deref() {
        if !state.allowed_images.permits(Some(image)) {
            return ApiError::disallowed_image(image).into_response();
        }
    }

    let request = request_from_payload(project_id, envelope.compile);
    let summary = state.compile.compile(request).await;
    let status_code = http_status_for(summary.status);
    let body = summary_to_api(summary, state.output_url_prefix.clone());

    (status_code, Json(body)).into_response()
}

fn http_status_for(status: CompileStatus) -> StatusCode {
    match status {
        CompileStatus::Success | CompileStatus::Failure | CompileStatus::Timedout => StatusCode::OK,
        CompileStatus::Error => StatusCode::INTERNAL_SERVER_ERROR,
        CompileStatus::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_mapping_matches_the_taxonomy() {
        assert_eq!(http_status_for(CompileStatus::Success), StatusCode::OK);
        assert_eq!(http_status_for(CompileStatus::Failure), StatusCode::OK);
        assert_eq!(http_status_for(CompileStatus::Timedout), StatusCode::OK);
        assert_eq!(
            http_status_for(CompileStatus::Error),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            http_status_for(CompileStatus::Unavailable),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}

//! Word-count endpoint.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use torchio_api_types::WordCountResponse;

use crate::domain::compile::ProjectId;

use super::HttpState;
use super::error::ApiError;
use super::models::{engine_to_api, report_to_api};

fn default_file() -> String {
    "main.tex".to_string()
}

#[derive(Debug, Deserialize)]
pub struct WordCountQuery {
    #[serde(default = "default_file")]
    pub file: String,
    pub image: Option<String>,
}

/// `GET /project/{project_id}/wordcount`.
pub async fn wordcount(
    State(state): State<HttpState>,
    Path(project_id): Path<String>,
    Query(query): Query<WordCountQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let project_id = ProjectId::parse(project_id)
        .map_err(|err| ApiError::bad_request("invalid project id", Some(err.to_string())))?;
    if !state.allowed_images.permits(query.image.as_deref()) {
        return Err(ApiError::disallowed_image(
            query.image.as_deref().unwrap_or_default(),
        ));
    }

    let report = state
        .word_counter
        .word_count(&project_id, query.image.as_deref(), &query.file)
        .await
        .map_err(engine_to_api)?;

    Ok(Json(WordCountResponse {
        texcount: report_to_api(report),
    }))
}

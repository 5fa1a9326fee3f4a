//! Forward and inverse position-sync endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use torchio_api_types::{SyncFromCodeResponse, SyncFromPdfResponse};

use crate::domain::compile::ProjectId;
use crate::domain::sync::{OutputLocation, SourceLocation};

use super::HttpState;
use super::error::ApiError;
use super::models::{code_position_to_api, engine_to_api, pdf_position_to_api};

#[derive(Debug, Deserialize)]
pub struct SyncFromCodeQuery {
    pub file: String,
    pub line: u32,
    pub column: u32,
    #[serde(rename = "imageName")]
    pub image_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SyncFromPdfQuery {
    pub page: u32,
    pub h: f64,
    pub v: f64,
    #[serde(rename = "imageName")]
    pub image_name: Option<String>,
}

/// `GET /project/{project_id}/sync/code`: source position to rendered
/// output positions.
pub async fn sync_from_code(
    State(state): State<HttpState>,
    Path(project_id): Path<String>,
    Query(query): Query<SyncFromCodeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let project_id = ProjectId::parse(project_id)
        .map_err(|err| ApiError::bad_request("invalid project id", Some(err.to_string())))?;
    if !state.allowed_images.permits(query.image_name.as_deref()) {
        return Err(ApiError::disallowed_image(
            query.image_name.as_deref().unwrap_or_default(),
        ));
    }

    let location = SourceLocation {
        file: query.file,
        line: query.line,
        column: query.column,
    };
    let positions = state
        .mapper
        .source_to_output(&project_id, query.image_name.as_deref(), &location)
        .await
        .map_err(engine_to_api)?;

    Ok(Json(SyncFromCodeResponse {
        pdf: positions.into_iter().map(pdf_position_to_api).collect(),
    }))
}

/// `GET /project/{project_id}/sync/pdf`: rendered output position back to
/// source positions.
pub async fn sync_from_pdf(
    State(state): State<HttpState>,
    Path(project_id): Path<String>,
    Query(query): Query<SyncFromPdfQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let project_id = ProjectId::parse(project_id)
        .map_err(|err| ApiError::bad_request("invalid project id", Some(err.to_string())))?;
    if !state.allowed_images.permits(query.image_name.as_deref()) {
        return Err(ApiError::disallowed_image(
            query.image_name.as_deref().unwrap_or_default(),
        ));
    }

    let location = OutputLocation {
        page: query.page,
        h: query.h,
        v: query.v,
    };
    let positions = state
        .mapper
        .output_to_source(&project_id, query.image_name.as_deref(), &location)
        .await
        .map_err(engine_to_api)?;

    Ok(Json(SyncFromPdfResponse {
        code: positions.into_iter().map(code_position_to_api).collect(),
    }))
}

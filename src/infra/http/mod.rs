mod compile;
pub mod error;
mod images;
mod models;
mod sync;
mod wordcount;

pub use images::AllowedImages;

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};

use crate::application::compile::CompileService;
use crate::application::sync::PositionMapper;
use crate::application::wordcount::WordCounter;

#[derive(Clone)]
pub struct HttpState {
    pub compile: Arc<CompileService>,
    pub mapper: Arc<PositionMapper>,
    pub word_counter: Arc<WordCounter>,
    pub allowed_images: Arc<AllowedImages>,
    pub output_url_prefix: String,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/project/{project_id}/compile", post(compile::compile))
        .route("/project/{project_id}/sync/code", get(sync::sync_from_code))
        .route("/project/{project_id}/sync/pdf", get(sync::sync_from_pdf))
        .route("/project/{project_id}/wordcount", get(wordcount::wordcount))
        .with_state(state)
}

async fn status() -> (StatusCode, &'static str) {
    (StatusCode::OK, "torchio is up")
}

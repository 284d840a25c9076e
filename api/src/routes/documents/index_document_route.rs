//! POST /index_document: embeds and stores the chunks of one document.

use std::sync::Arc;

use axum::{Json, extract::State, response::Response};
use tracing::instrument;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::{AppError, AppResult},
    routes::documents::document_requests::{IndexDocumentRequest, IndexDocumentResponse},
};

#[instrument(name = "index_document_route", skip_all, fields(filename = %body.filename, chunks = body.chunks.len()))]
pub async fn index_document_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<IndexDocumentRequest>,
) -> AppResult<Response> {
    let filename = body.filename.trim();
    if filename.is_empty() {
        return Err(AppError::bad_request("filename", "filename is required"));
    }
    if body.chunks.iter().all(|c| c.trim().is_empty()) {
        return Err(AppError::bad_request("chunks", "at least one non-empty chunk is required"));
    }

    let chunks = state.indexer.index(filename, &body.chunks).await?;
    Ok(ApiResponse::ok(IndexDocumentResponse {
        filename: filename.to_string(),
        chunks,
    }))
}

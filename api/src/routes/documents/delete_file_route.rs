//! DELETE /delete_file: removes a document from the index and the repository.

use std::sync::Arc;

use axum::{Json, extract::State, response::Response};
use tracing::instrument;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::{AppError, AppResult},
    routes::documents::document_requests::{DeleteFileRequest, DeleteFileResponse},
};

#[instrument(name = "delete_file_route", skip_all, fields(filename = %body.filename))]
pub async fn delete_file_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DeleteFileRequest>,
) -> AppResult<Response> {
    let filename = body.filename.trim();
    if filename.is_empty() {
        return Err(AppError::bad_request("filename", "filename is required"));
    }

    let removed_chunks = state.indexer.remove(filename).await?;
    Ok(ApiResponse::ok(DeleteFileResponse {
        filename: filename.to_string(),
        removed_chunks,
    }))
}

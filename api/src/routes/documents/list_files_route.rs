use std::sync::Arc;

use axum::{extract::State, response::Response};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::AppResult,
    routes::documents::document_requests::ListFilesResponse,
};

/// Handler: GET /list_files
pub async fn list_files_route(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    let files = state.indexer.list().await?;
    Ok(ApiResponse::ok(ListFilesResponse { files }))
}

//! POST /enhanced_search: answers a question over the indexed documents.

use std::sync::Arc;

use axum::{Json, extract::State, response::Response};
use tracing::{info, instrument};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::{AppError, AppResult},
    routes::enhanced_search::enhanced_search_request::{
        EnhancedSearchRequest, EnhancedSearchResponse,
    },
};

/// Handler: POST /enhanced_search
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:3000/enhanced_search \
///   -H 'content-type: application/json' \
///   -d '{"query":"Who has Spring Boot experience?","rerankingEnabled":true}'
/// ```
#[instrument(
    name = "enhanced_search_route",
    skip_all,
    fields(enhanced = body.use_enhanced_search, rerank = body.reranking_enabled)
)]
pub async fn enhanced_search_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EnhancedSearchRequest>,
) -> AppResult<Response> {
    let query = body.query.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(AppError::bad_request("query", "Query is required"));
    }

    let resp = state.pipeline.answer_query(query, body.options()).await?;
    let payload = EnhancedSearchResponse::new(query, resp);
    info!(
        query_len = query.len(),
        outcome = payload.outcome,
        sources = payload.sources.len(),
        "search answered"
    );

    Ok(ApiResponse::ok(payload))
}

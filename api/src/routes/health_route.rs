//! GET /health: credential status plus a live probe of every provider profile.

use std::sync::Arc;

use ai_llm_service::{CredentialStatus, health_service::SlotHealth};
use axum::{extract::State, response::Response};
use serde::Serialize;

use crate::core::{app_state::AppState, http::response_envelope::ApiResponse};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` when credentials are valid and every probe passed.
    pub status: &'static str,
    pub credentials: CredentialStatus,
    pub providers: Vec<SlotHealth>,
}

pub async fn health_route(State(state): State<Arc<AppState>>) -> Response {
    let credentials = state.pipeline.readiness().clone();
    let providers = match &state.llm {
        Some(llm) => llm.health_all().await,
        None => Vec::new(),
    };
    let status = if credentials.is_valid && providers.iter().all(|p| p.ok) {
        "ok"
    } else {
        "degraded"
    };
    ApiResponse::ok(HealthResponse {
        status,
        credentials,
        providers,
    })
}

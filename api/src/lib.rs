//! HTTP surface for the document Q&A backend.

use std::{env, sync::Arc};

pub mod core {
    pub mod app_state;
    pub mod http {
        pub mod response_envelope;
    }
}
pub mod error_handler;
mod middleware_layer {
    pub mod json_extractor;
    pub mod request_id;
}
mod routes;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tokio::signal;
use tracing::info;

pub use crate::core::app_state::AppState;
pub use crate::error_handler::{AppError, AppResult};

use crate::middleware_layer::{json_extractor::json_error_mapper, request_id::request_id};
use crate::routes::{
    documents::{
        delete_file_route::delete_file_route, index_document_route::index_document_route,
        list_files_route::list_files_route,
    },
    enhanced_search::enhanced_search_route::enhanced_search_route,
    health_route::health_route,
};

const DEFAULT_ADDRESS: &str = "127.0.0.1:3000";

/// Builds the router over an already-wired state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/enhanced_search", post(enhanced_search_route))
        .route("/index_document", post(index_document_route))
        .route("/delete_file", delete(delete_file_route))
        .route("/list_files", get(list_files_route))
        .route("/health", get(health_route))
        .layer(middleware::from_fn(json_error_mapper))
        .layer(middleware::from_fn(request_id))
        .with_state(state)
}

/// Wires providers, store and pipeline from the environment and serves until Ctrl+C.
pub async fn start() -> AppResult<()> {
    let host_url = env::var("API_ADDRESS").unwrap_or_else(|_| DEFAULT_ADDRESS.to_string());

    let state = Arc::new(AppState::from_env().await?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&host_url)
        .await
        .map_err(AppError::Bind)?;
    info!(address = %host_url, "api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("api stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

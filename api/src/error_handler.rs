use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rag_pipeline::{PipelineError, PortError};
use thiserror::Error;
use tracing::{error, warn};

use crate::core::http::response_envelope::{ApiErrorDetail, ApiResponse};

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    /// Missing or invalid provider credentials, or unusable settings.
    #[error("{0}")]
    Config(String),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("{message}")]
    BadRequest {
        message: String,
        field: Option<&'static str>,
    },

    #[error("not found: {0}")]
    NotFound(String),

    /// Rich HTTP error mapped from lower layers with specific status & code.
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl AppError {
    pub fn bad_request(field: &'static str, message: impl Into<String>) -> Self {
        AppError::BadRequest {
            message: message.into(),
            field: Some(field),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Http { status, .. } => *status,
            AppError::Config(_) | AppError::Bind(_) | AppError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest { .. } => "BAD_REQUEST",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Http { code, .. } => code,
        }
    }

    fn details(&self) -> Vec<ApiErrorDetail> {
        match self {
            AppError::Config(_) => vec![ApiErrorDetail::hint(
                "Please check your COHERE_API_KEY and provider environment variables.",
            )],
            AppError::BadRequest {
                field: Some(f),
                message,
            } => vec![ApiErrorDetail::field(f, message.clone())],
            _ => Vec::new(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = self.error_code(), error = %self, "request failed");
        } else {
            warn!(code = self.error_code(), error = %self, "request rejected");
        }
        ApiResponse::<()>::error(self.error_code(), self.to_string(), self.details())
            .into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest {
            message: err.body_text(),
            field: None,
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Input(message) => AppError::BadRequest {
                message,
                field: None,
            },
            PipelineError::Configuration(m) => AppError::Config(m),
            PipelineError::NotFound(source) => AppError::NotFound(source),
            PipelineError::Port(e @ PortError::Configuration { .. }) => {
                AppError::Config(e.to_string())
            }
            PipelineError::Port(e) => AppError::Http {
                status: StatusCode::BAD_GATEWAY,
                code: "UPSTREAM_ERROR",
                message: e.to_string(),
            },
            PipelineError::Store(e) => AppError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "STORE_ERROR",
                message: e.to_string(),
            },
        }
    }
}

impl From<rag_store::RagError> for AppError {
    fn from(err: rag_store::RagError) -> Self {
        match err {
            rag_store::RagError::Config(m) => AppError::Config(m),
            other => AppError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "STORE_ERROR",
                message: other.to_string(),
            },
        }
    }
}

impl From<ai_llm_service::AiLlmError> for AppError {
    fn from(err: ai_llm_service::AiLlmError) -> Self {
        AppError::Config(err.to_string())
    }
}

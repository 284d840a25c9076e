//! Shared LLM access for the document answer backend.
//!
//! The crate wraps two providers behind one profile service:
//! - **Cohere** for embeddings (`search_query` / `search_document`), chat and rerank
//! - **Ollama** for local generation and embeddings
//!
//! Build a [`service_profiles::LlmServiceProfiles`] once (usually via
//! [`service_profiles::LlmServiceProfiles::from_env`]), wrap it in `Arc`, and
//! share it. Credentials are validated during construction and the outcome is
//! exposed as a [`credentials::CredentialStatus`].

pub mod config {
    pub mod default_config;
    pub mod llm_model_config;
    pub mod llm_provider;
}

pub mod services {
    pub mod cohere_service;
    pub mod ollama_service;
}

pub mod credentials;
pub mod error_handler;
pub mod health_service;
pub mod service_profiles;
pub mod telemetry;
pub mod types;

pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use credentials::CredentialStatus;
pub use error_handler::{AiLlmError, Result};
pub use service_profiles::LlmServiceProfiles;
pub use types::{EmbedPurpose, GenerateOptions, RerankHit};

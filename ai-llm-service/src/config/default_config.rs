//! Default profile configs loaded from environment variables.
//!
//! Three roles are built:
//!
//! - **Generation** → chat/generate model (query expansion, answers)
//! - **Embedding**  → query/document vectors
//! - **Rerank**     → Cohere rerank model; optional
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND` = `cohere` (default) or `ollama`
//! - `LLM_MAX_TOKENS` = optional default max tokens (u32)
//! - `LLM_TIMEOUT_SECS` = optional request timeout (u64)
//!
//! Cohere:
//! - `COHERE_API_KEY` (validated later, see [`crate::credentials`])
//! - `COHERE_URL` (default `https://api.cohere.ai`)
//! - `COHERE_CHAT_MODEL` (default `command-r-08-2024`)
//! - `COHERE_EMBED_MODEL` (default `embed-english-v3.0`)
//! - `COHERE_RERANK_MODEL` (default `rerank-english-v3.0`)
//!
//! Ollama:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory)
//! - `OLLAMA_MODEL`                = generation model (mandatory)
//! - `EMBEDDING_MODEL`             = embedding model (mandatory)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, ConfigError, env_opt, env_opt_u32, env_opt_u64, env_or, must_env},
};

pub const DEFAULT_COHERE_URL: &str = "https://api.cohere.ai";
pub const DEFAULT_COHERE_CHAT_MODEL: &str = "command-r-08-2024";
pub const DEFAULT_COHERE_EMBED_MODEL: &str = "embed-english-v3.0";
pub const DEFAULT_COHERE_RERANK_MODEL: &str = "rerank-english-v3.0";

/// Profiles resolved from the environment.
#[derive(Debug, Clone)]
pub struct ProfileSet {
    pub generation: LlmModelConfig,
    pub embedding: LlmModelConfig,
    pub rerank: Option<LlmModelConfig>,
}

/// Reads `LLM_KIND`, defaulting to Cohere.
pub fn provider_from_env() -> Result<LlmProvider, AiLlmError> {
    match env_opt("LLM_KIND") {
        Some(kind) => Ok(kind.parse::<LlmProvider>()?),
        None => Ok(LlmProvider::Cohere),
    }
}

/// Builds every profile for the provider selected by `LLM_KIND`.
///
/// With Ollama, rerank still goes to Cohere when `COHERE_API_KEY` is set;
/// otherwise there is no rerank profile.
pub fn profiles_from_env() -> Result<ProfileSet, AiLlmError> {
    match provider_from_env()? {
        LlmProvider::Cohere => Ok(ProfileSet {
            generation: config_cohere_chat()?,
            embedding: config_cohere_embedding()?,
            rerank: Some(config_cohere_rerank()?),
        }),
        LlmProvider::Ollama => {
            let rerank = match env_opt("COHERE_API_KEY") {
                Some(_) => Some(config_cohere_rerank()?),
                None => None,
            };
            Ok(ProfileSet {
                generation: config_ollama_generation()?,
                embedding: config_ollama_embedding()?,
                rerank,
            })
        }
    }
}

fn cohere_base(model_var: &str, default_model: &str) -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        provider: LlmProvider::Cohere,
        model: env_or(model_var, default_model),
        endpoint: env_or("COHERE_URL", DEFAULT_COHERE_URL),
        // Checked by `credentials::check_profiles`.
        api_key: env_opt("COHERE_API_KEY").map(|k| k.trim().to_string()),
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(60)),
    })
}

/// Cohere chat profile.
///
/// # Defaults
/// - `temperature = Some(0.1)`
pub fn config_cohere_chat() -> Result<LlmModelConfig, AiLlmError> {
    let mut cfg = cohere_base("COHERE_CHAT_MODEL", DEFAULT_COHERE_CHAT_MODEL)?;
    cfg.max_tokens = env_opt_u32("LLM_MAX_TOKENS")?;
    cfg.temperature = Some(0.1);
    Ok(cfg)
}

/// Cohere embedding profile.
pub fn config_cohere_embedding() -> Result<LlmModelConfig, AiLlmError> {
    cohere_base("COHERE_EMBED_MODEL", DEFAULT_COHERE_EMBED_MODEL)
}

/// Cohere rerank profile.
pub fn config_cohere_rerank() -> Result<LlmModelConfig, AiLlmError> {
    cohere_base("COHERE_RERANK_MODEL", DEFAULT_COHERE_RERANK_MODEL)
}

/// Resolves the Ollama endpoint strictly from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
fn ollama_endpoint() -> Result<String, AiLlmError> {
    if let Some(url) = env_opt("OLLAMA_URL") {
        return Ok(url);
    }
    if let Some(port) = env_opt("OLLAMA_PORT") {
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(format!("http://localhost:{port}"));
    }
    Err(AiLlmError::Config(ConfigError::MissingVar(
        "OLLAMA_URL or OLLAMA_PORT",
    )))
}

/// Ollama generation profile.
///
/// # Defaults
/// - `temperature = Some(0.2)`
/// - `timeout_secs = Some(600)`
pub fn config_ollama_generation() -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model: must_env("OLLAMA_MODEL")?,
        endpoint: ollama_endpoint()?,
        api_key: None,
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(0.2),
        top_p: None,
        timeout_secs: Some(env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(600)),
    })
}

/// Ollama embedding profile.
///
/// # Defaults
/// - `temperature = Some(0.0)` (deterministic)
/// - `timeout_secs = Some(30)`
pub fn config_ollama_embedding() -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model: must_env("EMBEDDING_MODEL")?,
        endpoint: ollama_endpoint()?,
        api_key: None,
        max_tokens: None,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(30),
    })
}

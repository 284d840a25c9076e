use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{Result, validate_http_endpoint, validate_range_f32};

/// Configuration for one model profile.
///
/// `max_tokens` and `temperature` are defaults; callers may override them per
/// request through [`crate::types::GenerateOptions`].
///
/// ```
/// use ai_llm_service::{LlmModelConfig, LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::Cohere,
///     model: "command-r-08-2024".to_string(),
///     endpoint: "https://api.cohere.ai".to_string(),
///     api_key: Some("abc_DEF-123456".to_string()),
///     max_tokens: Some(500),
///     temperature: Some(0.1),
///     top_p: None,
///     timeout_secs: Some(30),
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The provider/backend.
    pub provider: LlmProvider,

    /// Model identifier string (e.g., `"embed-english-v3.0"`).
    pub model: String,

    /// Base URL of the provider API.
    pub endpoint: String,

    /// API key for hosted providers.
    pub api_key: Option<String>,

    /// Default maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Default sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Checks the static shape of the profile (endpoint scheme, model, ranges).
    ///
    /// Credentials are checked separately by [`crate::credentials`], so a
    /// profile with a bad key still validates here.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(crate::error_handler::ConfigError::EmptyModel.into());
        }
        validate_http_endpoint("endpoint", self.endpoint.trim())?;
        if let Some(t) = self.temperature {
            validate_range_f32("temperature", t, 0.0, 2.0)?;
        }
        if let Some(p) = self.top_p {
            validate_range_f32("top_p", p, 0.0, 1.0)?;
        }
        Ok(())
    }
}

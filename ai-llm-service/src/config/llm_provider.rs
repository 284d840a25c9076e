use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error_handler::ConfigError;

/// Represents the provider (backend) used for inference.
///
/// ```
/// use ai_llm_service::LlmProvider;
///
/// let p: LlmProvider = "cohere".parse().unwrap();
/// assert_eq!(p, LlmProvider::Cohere);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LlmProvider {
    /// Local Ollama runtime.
    Ollama,
    /// Hosted Cohere API (embed/chat/rerank).
    Cohere,
}

impl LlmProvider {
    /// Whether the provider exposes a rerank endpoint.
    pub fn supports_rerank(self) -> bool {
        matches!(self, LlmProvider::Cohere)
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProvider::Ollama => f.write_str("ollama"),
            LlmProvider::Cohere => f.write_str("cohere"),
        }
    }
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(LlmProvider::Ollama),
            "cohere" => Ok(LlmProvider::Cohere),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}

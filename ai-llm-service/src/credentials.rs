//! API key validation, done once when the profile service is built.
//!
//! Hosted providers need a key that is set, at least [`MIN_KEY_LEN`]
//! characters long, and made only of `[A-Za-z0-9_-]`. The result of the check
//! is kept as a [`CredentialStatus`] so request handlers can report a
//! configuration error without re-reading the environment.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::ConfigError;

pub const MIN_KEY_LEN: usize = 10;

static KEY_CHARSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("valid key regex"));

/// Outcome of credential validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CredentialStatus {
    pub is_valid: bool,
    /// Diagnostic naming the offending setting when `is_valid` is false.
    pub error: Option<String>,
}

impl CredentialStatus {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    pub fn invalid(err: &ConfigError) -> Self {
        Self {
            is_valid: false,
            error: Some(err.to_string()),
        }
    }
}

/// Checks a single API key against the format rules.
pub fn validate_api_key(var: &'static str, key: Option<&str>) -> Result<(), ConfigError> {
    let key = match key.map(str::trim) {
        Some(k) if !k.is_empty() => k,
        _ => return Err(ConfigError::MissingVar(var)),
    };
    if key.len() < MIN_KEY_LEN {
        return Err(ConfigError::InvalidCredential {
            var,
            reason: "key is too short",
        });
    }
    if !KEY_CHARSET.is_match(key) {
        return Err(ConfigError::InvalidCredential {
            var,
            reason: "key contains characters outside [A-Za-z0-9_-]",
        });
    }
    Ok(())
}

/// Env var that carries the key for a given provider.
pub fn key_var(provider: LlmProvider) -> Option<&'static str> {
    match provider {
        LlmProvider::Cohere => Some("COHERE_API_KEY"),
        LlmProvider::Ollama => None,
    }
}

/// Validates every profile that talks to a hosted provider.
///
/// The first failure wins; local providers are always valid.
pub fn check_profiles<'a, I>(profiles: I) -> CredentialStatus
where
    I: IntoIterator<Item = &'a LlmModelConfig>,
{
    for cfg in profiles {
        let Some(var) = key_var(cfg.provider) else {
            continue;
        };
        if let Err(e) = validate_api_key(var, cfg.api_key.as_deref()) {
            warn!(provider = %cfg.provider, model = %cfg.model, error = %e, "credential check failed");
            return CredentialStatus::invalid(&e);
        }
    }
    info!("credential check passed");
    CredentialStatus::valid()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cohere(key: Option<&str>) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Cohere,
            model: "embed-english-v3.0".into(),
            endpoint: "https://api.cohere.ai".into(),
            api_key: key.map(str::to_string),
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: None,
        }
    }

    #[test]
    fn missing_key_names_the_variable() {
        let err = validate_api_key("COHERE_API_KEY", None).unwrap_err();
        assert_eq!(err, ConfigError::MissingVar("COHERE_API_KEY"));
        assert!(validate_api_key("COHERE_API_KEY", Some("   ")).is_err());
    }

    #[test]
    fn short_or_odd_keys_are_rejected() {
        assert!(validate_api_key("K", Some("abc123")).is_err());
        assert!(validate_api_key("K", Some("abc123def!456")).is_err());
        assert!(validate_api_key("K", Some("abc 123 def 456")).is_err());
        assert!(validate_api_key("K", Some("abc_123-DEF456")).is_ok());
    }

    #[test]
    fn ollama_profiles_need_no_key() {
        let mut local = cohere(None);
        local.provider = LlmProvider::Ollama;
        assert!(check_profiles([&local]).is_valid);
    }

    #[test]
    fn first_bad_profile_is_reported() {
        let good = cohere(Some("abc_123-DEF456"));
        let bad = cohere(Some("short"));
        let status = check_profiles([&good, &bad]);
        assert!(!status.is_valid);
        assert!(status.error.unwrap_or_default().contains("COHERE_API_KEY"));
    }
}

//! Unified error handling for `ai-llm-service`.
//!
//! This module exposes a single top-level error type [`AiLlmError`] for the whole
//! library, and groups domain-specific errors in nested enums ([`ConfigError`],
//! [`HealthError`], [`ProviderError`]). Small helpers for reading/validating
//! environment variables return the unified [`Result<T>`] alias.
//!
//! All messages include the suffix `[AI LLM Service]` to simplify attribution in logs.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, AiLlmError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `ai-llm-service` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AiLlmError {
    /// Configuration/validation errors (startup/readiness).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Health-check/connectivity/decoding errors.
    #[error(transparent)]
    Health(#[from] HealthError),

    /// Provider call failed (bad status, bad payload, unsupported operation).
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Underlying HTTP transport error.
    #[error("[AI LLM Service] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),

    /// Operation exceeded the configured timeout.
    #[error("[AI LLM Service] operation timed out after {0:?}")]
    Timeout(Duration),
}

impl AiLlmError {
    /// True for errors caused by configuration rather than by the upstream.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            AiLlmError::Config(_)
                | AiLlmError::Provider(ProviderError {
                    kind: ProviderErrorKind::MissingApiKey
                        | ProviderErrorKind::InvalidProvider
                        | ProviderErrorKind::InvalidEndpoint(_),
                    ..
                })
        )
    }
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for environment/config-driven setup.
#[non_exhaustive]
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[AI LLM Service] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (like ports, limits, timeouts).
    #[error("[AI LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        var: &'static str,
        reason: &'static str,
    },

    /// Unsupported provider in `LLM_KIND`.
    #[error("[AI LLM Service] unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[AI LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        var: &'static str,
        reason: &'static str,
    },

    /// An API key is present but unusable.
    #[error("[AI LLM Service] invalid credential in {var}: {reason}")]
    InvalidCredential {
        var: &'static str,
        reason: &'static str,
    },

    /// A numeric field was outside of the allowed range.
    #[error("[AI LLM Service] {field} is out of range: {detail}")]
    OutOfRange {
        field: &'static str,
        detail: &'static str,
    },

    /// Model name was empty.
    #[error("[AI LLM Service] model name must not be empty")]
    EmptyModel,
}

/* ------------------------------------------------------------------------- */
/* HTTP status detail                                                        */
/* ------------------------------------------------------------------------- */

/// Non-2xx response detail, shared by provider and health errors.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub status: StatusCode,
    pub url: String,
    /// Short, trimmed snippet of the response body.
    pub snippet: String,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {} from {}: {}", self.status, self.url, self.snippet)
    }
}

/// Maximum characters kept from an error body.
const SNIPPET_CHARS: usize = 240;

/// Collapses whitespace and cuts a response body to a log-friendly snippet.
pub fn make_snippet(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= SNIPPET_CHARS {
        collapsed
    } else {
        let mut s: String = collapsed.chars().take(SNIPPET_CHARS).collect();
        s.push('…');
        s
    }
}

/* ------------------------------------------------------------------------- */
/* Health errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for provider health checks.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HealthError {
    /// The endpoint is empty or does not start with http/https.
    #[error("[AI LLM Service] invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Upstream returned a non-successful HTTP status.
    #[error("[AI LLM Service] {0}")]
    HttpStatus(HttpError),

    /// Health probe could not be built or decoded.
    #[error("[AI LLM Service] decode error: {0}")]
    Decode(String),
}

/* ------------------------------------------------------------------------- */
/* Provider errors                                                           */
/* ------------------------------------------------------------------------- */

/// Which provider raised a [`ProviderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Ollama,
    Cohere,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Ollama => f.write_str("Ollama"),
            Provider::Cohere => f.write_str("Cohere"),
        }
    }
}

/// What went wrong inside a provider client.
#[derive(Debug, Clone)]
pub enum ProviderErrorKind {
    InvalidProvider,
    MissingApiKey,
    InvalidEndpoint(String),
    HttpStatus(HttpError),
    Decode(String),
    /// Response decoded but carried nothing usable (no text, no vectors).
    EmptyResponse,
    /// The provider has no such operation (e.g. rerank on Ollama).
    Unsupported(&'static str),
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderErrorKind::InvalidProvider => f.write_str("invalid provider for this client"),
            ProviderErrorKind::MissingApiKey => f.write_str("missing API key"),
            ProviderErrorKind::InvalidEndpoint(e) => write!(f, "invalid endpoint: {e}"),
            ProviderErrorKind::HttpStatus(h) => write!(f, "{h}"),
            ProviderErrorKind::Decode(m) => write!(f, "decode error: {m}"),
            ProviderErrorKind::EmptyResponse => f.write_str("empty response"),
            ProviderErrorKind::Unsupported(op) => write!(f, "unsupported operation: {op}"),
        }
    }
}

/// Provider-scoped failure.
#[derive(Debug, Clone, Error)]
#[error("[AI LLM Service] {provider}: {kind}")]
pub struct ProviderError {
    pub provider: Provider,
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    pub fn new(provider: Provider, kind: ProviderErrorKind) -> Self {
        Self { provider, kind }
    }
}

/* ------------------------------------------------------------------------- */
/* Env helpers (return unified `Result<T>`)                                  */
/* ------------------------------------------------------------------------- */

/// Fetches a required, non-empty environment variable.
pub fn must_env(name: &'static str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name).into()),
    }
}

/// Fetches an optional environment variable (`None` if unset/empty).
pub fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Fetches an environment variable or returns `default`.
pub fn env_or(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_string())
}

/// Parses an optional `u32` from env (`Ok(None)` if unset/empty).
pub fn env_opt_u32(name: &'static str) -> Result<Option<u32>> {
    match env_opt(name) {
        Some(v) => v.trim().parse::<u32>().map(Some).map_err(|_| {
            AiLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u32",
            })
        }),
        None => Ok(None),
    }
}

/// Parses an optional `u64` from env (`Ok(None)` if unset/empty).
pub fn env_opt_u64(name: &'static str) -> Result<Option<u64>> {
    match env_opt(name) {
        Some(v) => v.trim().parse::<u64>().map(Some).map_err(|_| {
            AiLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u64",
            })
        }),
        None => Ok(None),
    }
}

/* ------------------------------------------------------------------------- */
/* Validation helpers (return unified `Result<T>`)                           */
/* ------------------------------------------------------------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}

/// Validates that a floating-point value lies within an inclusive range.
pub fn validate_range_f32(field: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            detail: "expected value in inclusive range",
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_collapses_and_truncates() {
        assert_eq!(make_snippet("  a \n\t b  "), "a b");
        let long = "x".repeat(500);
        let s = make_snippet(&long);
        assert_eq!(s.chars().count(), SNIPPET_CHARS + 1);
        assert!(s.ends_with('…'));
    }

    #[test]
    fn endpoint_scheme_is_checked() {
        assert!(validate_http_endpoint("X", "https://api.cohere.ai").is_ok());
        assert!(validate_http_endpoint("X", "api.cohere.ai").is_err());
    }

    #[test]
    fn range_rejects_nan_and_bounds() {
        assert!(validate_range_f32("t", 0.5, 0.0, 1.0).is_ok());
        assert!(validate_range_f32("t", 1.5, 0.0, 1.0).is_err());
        assert!(validate_range_f32("t", f32::NAN, 0.0, 1.0).is_err());
    }

    #[test]
    fn config_errors_are_classified() {
        let e: AiLlmError = ConfigError::MissingVar("COHERE_API_KEY").into();
        assert!(e.is_config());
        let e: AiLlmError =
            ProviderError::new(Provider::Cohere, ProviderErrorKind::EmptyResponse).into();
        assert!(!e.is_config());
        let e: AiLlmError =
            ProviderError::new(Provider::Cohere, ProviderErrorKind::MissingApiKey).into();
        assert!(e.is_config());
    }
}

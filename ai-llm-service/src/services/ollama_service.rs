//! Lightweight Ollama service for text generation and embeddings.
//!
//! This module implements a thin client for the local Ollama API:
//! - `POST {endpoint}/api/generate`  : synchronous text generation (`stream=false`)
//! - `POST {endpoint}/api/embeddings`: embeddings retrieval, one text per call
//!
//! Ollama has no rerank endpoint and ignores the query/document embedding hint.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{
    AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
};
use crate::types::GenerateOptions;

/// Thin client for Ollama.
///
/// Initialized with a full [`LlmModelConfig`]. Reuses an HTTP client with
/// a configurable timeout.
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_generate: String,
    url_embeddings: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not `Ollama`
    /// - `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Ollama {
            return Err(err(ProviderErrorKind::InvalidProvider));
        }

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(err(ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone())));
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_generate = format!("{}/api/generate", base);
        let url_embeddings = format!("{}/api/embeddings", base);

        Ok(Self {
            client,
            cfg,
            url_generate,
            url_embeddings,
        })
    }

    /// Performs a **non-streaming** generation request via `/api/generate`.
    ///
    /// `opts` take precedence over the profile's `max_tokens` (`num_predict`)
    /// and `temperature`.
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn generate(&self, prompt: &str, opts: GenerateOptions) -> Result<String, AiLlmError> {
        let body = GenerateRequest::from_cfg(&self.cfg, prompt, opts);

        debug!("POST {}", self.url_generate);
        let resp = self
            .client
            .post(&self.url_generate)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(status_error(resp, &self.url_generate).await);
        }

        let out: GenerateResponse = resp.json().await.map_err(|e| {
            err(ProviderErrorKind::Decode(format!(
                "serde error: {e}; ensure `stream=false` is used"
            )))
        })?;

        Ok(out.response)
    }

    /// Retrieves embeddings via `/api/embeddings`.
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            prompt: input,
        };

        debug!("POST {}", self.url_embeddings);
        let resp = self
            .client
            .post(&self.url_embeddings)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(status_error(resp, &self.url_embeddings).await);
        }

        let out: EmbeddingsResponse = resp.json().await.map_err(|e| {
            err(ProviderErrorKind::Decode(format!(
                "serde error: {e}; expected `{{ embedding: number[] }}`"
            )))
        })?;

        if out.embedding.is_empty() {
            return Err(err(ProviderErrorKind::EmptyResponse));
        }
        Ok(out.embedding)
    }

    /// Embeds each text in turn; Ollama has no batch endpoint here.
    pub async fn embeddings_many(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiLlmError> {
        let mut out = Vec::with_capacity(inputs.len());
        for text in inputs {
            out.push(self.embeddings(text).await?);
        }
        Ok(out)
    }
}

#[inline]
fn err(kind: ProviderErrorKind) -> AiLlmError {
    ProviderError::new(Provider::Ollama, kind).into()
}

async fn status_error(resp: reqwest::Response, url: &str) -> AiLlmError {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    err(ProviderErrorKind::HttpStatus(HttpError {
        status,
        url: url.to_string(),
        snippet: make_snippet(&text),
    }))
}

/* ==========================
HTTP payloads & options
========================== */

/// Request body for `/api/generate` (non-streaming).
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

impl<'a> GenerateRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str, opts: GenerateOptions) -> Self {
        Self {
            model: &cfg.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: opts.temperature.or(cfg.temperature),
                top_p: cfg.top_p,
                num_predict: opts.max_tokens.or(cfg.max_tokens),
            },
        }
    }
}

/// Subset of Ollama `options`.
#[derive(Debug, Default, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

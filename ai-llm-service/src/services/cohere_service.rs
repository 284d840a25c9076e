//! Cohere service for embeddings, chat generation and reranking.
//!
//! Minimal, non-streaming client around the Cohere v1 REST API.
//! Endpoints are derived from `LlmModelConfig::endpoint`:
//! - POST {endpoint}/v1/embed : embeddings with `input_type` and `truncate: END`
//! - POST {endpoint}/v1/chat  : single-turn chat completion
//! - POST {endpoint}/v1/rerank: relevance scores for (query, document) pairs
//!
//! Constructor validation:
//! - `cfg.provider` must be `LlmProvider::Cohere`
//! - `cfg.api_key` must be present
//! - `cfg.endpoint` must start with http:// or https://

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, error, info, instrument};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
    },
    types::{EmbedPurpose, GenerateOptions, RerankHit},
};

/// Cohere accepts at most this many texts per `/v1/embed` call.
const EMBED_BATCH: usize = 96;

/// Thin client for the Cohere API.
#[derive(Debug)]
pub struct CohereService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_embed: String,
    url_chat: String,
    url_rerank: String,
}

impl CohereService {
    /// Creates a new [`CohereService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not Cohere
    /// - `MissingApiKey` if `cfg.api_key` is `None`
    /// - `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Cohere {
            return Err(err(ProviderErrorKind::InvalidProvider));
        }

        let api_key = cfg
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| err(ProviderErrorKind::MissingApiKey))?;

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

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", api_key.trim())).map_err(|e| {
                err(ProviderErrorKind::Decode(format!(
                    "invalid API key header: {e}"
                )))
            })?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();

        info!(
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "CohereService initialized"
        );

        Ok(Self {
            client,
            url_embed: format!("{base}/v1/embed"),
            url_chat: format!("{base}/v1/chat"),
            url_rerank: format!("{base}/v1/rerank"),
            cfg,
        })
    }

    /// Embeds `texts` in batches, keeping input order.
    ///
    /// # Errors
    /// Any failed batch fails the whole call; a count mismatch is a `Decode` error.
    #[instrument(skip_all, fields(model = %self.cfg.model, count = texts.len()))]
    pub async fn embed(
        &self,
        texts: &[String],
        purpose: EmbedPurpose,
    ) -> Result<Vec<Vec<f32>>, AiLlmError> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBED_BATCH) {
            let body = EmbedRequest {
                texts: batch,
                model: &self.cfg.model,
                input_type: purpose.cohere_input_type(),
                truncate: "END",
            };
            let resp: EmbedResponse = self.post_json(&self.url_embed, &body, "/v1/embed").await?;
            if resp.embeddings.len() != batch.len() {
                return Err(err(ProviderErrorKind::Decode(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    resp.embeddings.len()
                ))));
            }
            out.extend(resp.embeddings);
        }
        Ok(out)
    }

    /// Single-turn chat completion via `/v1/chat`.
    ///
    /// `opts` override the profile's `max_tokens`/`temperature`.
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn chat(&self, prompt: &str, opts: GenerateOptions) -> Result<String, AiLlmError> {
        let body = ChatRequest {
            message: prompt,
            model: &self.cfg.model,
            max_tokens: opts.max_tokens.or(self.cfg.max_tokens),
            temperature: opts.temperature.or(self.cfg.temperature),
        };
        let resp: ChatResponse = self.post_json(&self.url_chat, &body, "/v1/chat").await?;
        Ok(resp.text)
    }

    /// Scores `documents` against `query` via `/v1/rerank`.
    ///
    /// Results come back in the provider's order (best first); `index` refers
    /// to the position in `documents`.
    #[instrument(skip_all, fields(model = %self.cfg.model, docs = documents.len()))]
    pub async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_n: usize,
    ) -> Result<Vec<RerankHit>, AiLlmError> {
        let body = RerankRequest {
            query,
            documents,
            model: &self.cfg.model,
            top_n,
        };
        let resp: RerankResponse = self.post_json(&self.url_rerank, &body, "/v1/rerank").await?;
        Ok(resp
            .results
            .into_iter()
            .map(|r| RerankHit {
                index: r.index,
                relevance_score: r.relevance_score,
            })
            .collect())
    }

    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }

    async fn post_json<B, R>(&self, url: &str, body: &B, op: &'static str) -> Result<R, AiLlmError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let started = Instant::now();
        debug!(model = %self.cfg.model, "POST {}", url);

        let resp = self.client.post(url).json(body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "Cohere {op} returned non-success status"
            );

            return Err(err(ProviderErrorKind::HttpStatus(HttpError {
                status,
                url: url.to_string(),
                snippet,
            })));
        }

        let out: R = resp.json().await.map_err(|e| {
            error!(
                error = %e,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "failed to decode Cohere {op} response"
            );
            err(ProviderErrorKind::Decode(format!("serde error on {op}: {e}")))
        })?;

        info!(
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            "Cohere {op} completed"
        );
        Ok(out)
    }
}

#[inline]
fn err(kind: ProviderErrorKind) -> AiLlmError {
    ProviderError::new(Provider::Cohere, kind).into()
}

/* ===========================================================================
HTTP payloads
======================================================================== */

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    texts: &'a [String],
    model: &'a str,
    input_type: &'static str,
    truncate: &'static str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    documents: &'a [String],
    model: &'a str,
    top_n: usize,
}

#[derive(Debug, Deserialize)]
struct RerankResponse {
    results: Vec<RerankResult>,
}

#[derive(Debug, Deserialize)]
struct RerankResult {
    index: usize,
    relevance_score: f32,
}

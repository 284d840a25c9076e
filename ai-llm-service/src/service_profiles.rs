//! Shared LLM service with three profiles: `generation`, `embedding`, and `rerank`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (provider+endpoint+model+key+timeout).
//! - Validates hosted-provider credentials at construction; the outcome is
//!   available through [`LlmServiceProfiles::credential_status`].
//! - `rerank` is optional; without it [`LlmServiceProfiles::rerank`] fails
//!   with an `Unsupported` provider error.

use std::{
    collections::HashMap,
    hash::{Hash, Hasher},
    sync::Arc,
};

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{
    config::{
        default_config::{ProfileSet, profiles_from_env},
        llm_model_config::LlmModelConfig,
        llm_provider::LlmProvider,
    },
    credentials::{CredentialStatus, check_profiles},
    error_handler::{AiLlmError, Provider, ProviderError, ProviderErrorKind},
    health_service::{HealthService, ProfileSlot, SlotHealth},
    services::{cohere_service::CohereService, ollama_service::OllamaService},
    types::{EmbedPurpose, GenerateOptions, RerankHit},
};

/// Shared service over the generation, embedding and rerank profiles.
pub struct LlmServiceProfiles {
    generation: LlmModelConfig,
    embedding: LlmModelConfig,
    rerank: Option<LlmModelConfig>,

    ollama: RwLock<HashMap<ClientKey, Arc<OllamaService>>>,
    cohere: RwLock<HashMap<ClientKey, Arc<CohereService>>>,

    credentials: CredentialStatus,
    health: HealthService,
}

impl LlmServiceProfiles {
    /// Creates a new service.
    ///
    /// Static profile shape (endpoint, model, ranges) must be valid; bad
    /// credentials do not fail construction and are reported by
    /// [`Self::credential_status`] instead.
    pub fn new(
        generation: LlmModelConfig,
        embedding: LlmModelConfig,
        rerank: Option<LlmModelConfig>,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, AiLlmError> {
        generation.validate()?;
        embedding.validate()?;
        if let Some(r) = &rerank {
            r.validate()?;
            if !r.provider.supports_rerank() {
                return Err(ProviderError::new(
                    Provider::Ollama,
                    ProviderErrorKind::Unsupported("rerank"),
                )
                .into());
            }
        }

        let credentials = check_profiles(
            [&generation, &embedding]
                .into_iter()
                .chain(rerank.as_ref()),
        );

        info!(
            generation = %generation.model,
            embedding = %embedding.model,
            rerank = %rerank.as_ref().map(|r| r.model.as_str()).unwrap_or("none"),
            credentials_ok = credentials.is_valid,
            "LLM profiles ready"
        );

        Ok(Self {
            generation,
            embedding,
            rerank,
            ollama: RwLock::new(HashMap::new()),
            cohere: RwLock::new(HashMap::new()),
            credentials,
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// Builds the service from environment variables (see [`crate::config::default_config`]).
    pub fn from_env() -> Result<Self, AiLlmError> {
        let ProfileSet {
            generation,
            embedding,
            rerank,
        } = profiles_from_env()?;
        Self::new(generation, embedding, rerank, Some(10))
    }

    /// Result of the construction-time credential check.
    pub fn credential_status(&self) -> &CredentialStatus {
        &self.credentials
    }

    /// Generates text using the **generation** profile.
    pub async fn generate(&self, prompt: &str, opts: GenerateOptions) -> Result<String, AiLlmError> {
        let cfg = &self.generation;
        match cfg.provider {
            LlmProvider::Ollama => self.ollama_client(cfg).await?.generate(prompt, opts).await,
            LlmProvider::Cohere => self.cohere_client(cfg).await?.chat(prompt, opts).await,
        }
    }

    /// Computes embeddings for `texts`, positionally aligned with the input.
    pub async fn embed_many(
        &self,
        texts: &[String],
        purpose: EmbedPurpose,
    ) -> Result<Vec<Vec<f32>>, AiLlmError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let cfg = &self.embedding;
        debug!(count = texts.len(), ?purpose, "embedding batch");
        match cfg.provider {
            LlmProvider::Ollama => self.ollama_client(cfg).await?.embeddings_many(texts).await,
            LlmProvider::Cohere => self.cohere_client(cfg).await?.embed(texts, purpose).await,
        }
    }

    /// Computes a single embedding.
    pub async fn embed(&self, input: &str, purpose: EmbedPurpose) -> Result<Vec<f32>, AiLlmError> {
        let mut out = self.embed_many(&[input.to_string()], purpose).await?;
        out.pop().ok_or_else(|| {
            ProviderError::new(
                provider_tag(self.embedding.provider),
                ProviderErrorKind::EmptyResponse,
            )
            .into()
        })
    }

    /// Scores `documents` against `query` with the **rerank** profile.
    pub async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_n: usize,
    ) -> Result<Vec<RerankHit>, AiLlmError> {
        let cfg = self.rerank.as_ref().ok_or_else(|| {
            AiLlmError::from(ProviderError::new(
                provider_tag(self.generation.provider),
                ProviderErrorKind::Unsupported("rerank (no rerank profile configured)"),
            ))
        })?;
        self.cohere_client(cfg)
            .await?
            .rerank(query, documents, top_n)
            .await
    }

    /// Probes every configured slot against its provider's model catalog.
    pub async fn health_all(&self) -> Vec<SlotHealth> {
        let mut slots = vec![
            (ProfileSlot::Generation, &self.generation),
            (ProfileSlot::Embedding, &self.embedding),
        ];
        if let Some(rerank) = &self.rerank {
            slots.push((ProfileSlot::Rerank, rerank));
        }
        self.health.check(&slots).await
    }

    /// Returns references to the current profiles `(generation, embedding, rerank)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig, Option<&LlmModelConfig>) {
        (&self.generation, &self.embedding, self.rerank.as_ref())
    }

    /* --------------------- Internals --------------------- */

    async fn ollama_client(&self, cfg: &LlmModelConfig) -> Result<Arc<OllamaService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.ollama.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.ollama.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        let cli = Arc::new(OllamaService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }

    async fn cohere_client(&self, cfg: &LlmModelConfig) -> Result<Arc<CohereService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.cohere.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.cohere.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        let cli = Arc::new(CohereService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }
}

fn provider_tag(p: LlmProvider) -> Provider {
    match p {
        LlmProvider::Ollama => Provider::Ollama,
        LlmProvider::Cohere => Provider::Cohere,
    }
}

/// Internal cache key to identify unique client configs.
#[derive(Clone, Eq)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}

impl PartialEq for ClientKey {
    fn eq(&self, other: &Self) -> bool {
        self.provider == other.provider
            && self.endpoint == other.endpoint
            && self.model == other.model
            && self.api_key == other.api_key
            && self.timeout == other.timeout
    }
}

impl Hash for ClientKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.provider.hash(state);
        self.endpoint.hash(state);
        self.model.hash(state);
        self.api_key.hash(state);
        self.timeout.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(provider: LlmProvider, model: &str, key: Option<&str>) -> LlmModelConfig {
        LlmModelConfig {
            provider,
            model: model.into(),
            endpoint: match provider {
                LlmProvider::Cohere => "https://api.cohere.ai".into(),
                LlmProvider::Ollama => "http://localhost:11434".into(),
            },
            api_key: key.map(str::to_string),
            max_tokens: None,
            temperature: Some(0.1),
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn bad_key_is_reported_not_fatal() {
        let svc = LlmServiceProfiles::new(
            profile(LlmProvider::Cohere, "command-r-08-2024", Some("bad key!")),
            profile(LlmProvider::Cohere, "embed-english-v3.0", Some("bad key!")),
            None,
            Some(1),
        )
        .unwrap();
        assert!(!svc.credential_status().is_valid);
    }

    #[test]
    fn ollama_cannot_be_rerank_profile() {
        let res = LlmServiceProfiles::new(
            profile(LlmProvider::Ollama, "qwen3:14b", None),
            profile(LlmProvider::Ollama, "nomic-embed-text", None),
            Some(profile(LlmProvider::Ollama, "qwen3:14b", None)),
            Some(1),
        );
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn rerank_without_profile_is_unsupported() {
        let svc = LlmServiceProfiles::new(
            profile(LlmProvider::Ollama, "qwen3:14b", None),
            profile(LlmProvider::Ollama, "nomic-embed-text", None),
            None,
            Some(1),
        )
        .unwrap();
        assert!(svc.credential_status().is_valid);
        let err = svc.rerank("q", &["doc".to_string()], 1).await.unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::Unsupported(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn empty_batch_skips_the_provider() {
        let svc = LlmServiceProfiles::new(
            profile(LlmProvider::Ollama, "qwen3:14b", None),
            profile(LlmProvider::Ollama, "nomic-embed-text", None),
            None,
            Some(1),
        )
        .unwrap();
        let out = svc.embed_many(&[], EmbedPurpose::Query).await.unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn cache_key_tracks_model_and_key() {
        let a = profile(LlmProvider::Cohere, "m1", Some("abc_123-DEF456"));
        let mut b = a.clone();
        assert!(ClientKey::from(&a) == ClientKey::from(&b));
        b.model = "m2".into();
        assert!(ClientKey::from(&a) != ClientKey::from(&b));
    }
}

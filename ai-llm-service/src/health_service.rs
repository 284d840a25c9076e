//! Live probes for the configured model profiles.
//!
//! Each distinct provider endpoint is asked for its model catalog once
//! (`/api/tags` on Ollama, `/v1/models` on Cohere). Every profile slot is then
//! checked against that catalog: the model must be listed, and on Cohere it
//! must also serve the endpoint the slot calls (`chat`, `embed`, `rerank`).

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, ConfigError, HealthError, HttpError, make_snippet};

/// Role a profile plays in the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileSlot {
    Generation,
    Embedding,
    Rerank,
}

impl ProfileSlot {
    /// Cohere API endpoint a model must support to fill this slot.
    fn cohere_endpoint(self) -> &'static str {
        match self {
            ProfileSlot::Generation => "chat",
            ProfileSlot::Embedding => "embed",
            ProfileSlot::Rerank => "rerank",
        }
    }
}

/// Probe outcome for one profile slot.
#[derive(Debug, Clone, Serialize)]
pub struct SlotHealth {
    pub slot: ProfileSlot,
    pub provider: String,
    pub endpoint: String,
    pub model: String,
    pub ok: bool,
    /// Latency of the catalog request shared by every slot on that endpoint.
    pub latency_ms: u128,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ListedModel>,
}

/// Catalog entry. Ollama tags carry only `name`.
#[derive(Debug, Clone, Deserialize)]
struct ListedModel {
    name: String,
    #[serde(default)]
    endpoints: Vec<String>,
}

#[derive(Debug)]
struct Catalog {
    latency_ms: u128,
    listing: Result<Vec<ListedModel>, String>,
}

impl Catalog {
    fn find(&self, model: &str) -> Option<&ListedModel> {
        self.listing
            .as_ref()
            .ok()?
            .iter()
            .find(|m| model_matches(&m.name, model))
    }
}

/// Ollama reports untagged pulls as `name:latest`.
fn model_matches(listed: &str, wanted: &str) -> bool {
    listed == wanted
        || (!wanted.contains(':') && listed.strip_suffix(":latest") == Some(wanted))
}

fn assess(slot: ProfileSlot, cfg: &LlmModelConfig, catalog: &Catalog) -> SlotHealth {
    let (ok, message) = match (&catalog.listing, catalog.find(&cfg.model)) {
        (Err(reason), _) => (false, reason.clone()),
        (Ok(_), None) => (
            false,
            format!("model `{}` is not listed by {}", cfg.model, cfg.provider),
        ),
        (Ok(_), Some(m))
            if cfg.provider == LlmProvider::Cohere
                && !m.endpoints.is_empty()
                && !m.endpoints.iter().any(|e| e == slot.cohere_endpoint()) =>
        {
            (
                false,
                format!(
                    "model `{}` does not serve /v1/{}",
                    cfg.model,
                    slot.cohere_endpoint()
                ),
            )
        }
        (Ok(_), Some(_)) => (true, "model available".to_string()),
    };

    SlotHealth {
        slot,
        provider: cfg.provider.to_string(),
        endpoint: cfg.endpoint.clone(),
        model: cfg.model.clone(),
        ok,
        latency_ms: catalog.latency_ms,
        message,
    }
}

/// Runs catalog probes over a shared HTTP client.
pub struct HealthService {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl HealthService {
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let default_timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder()
            .timeout(default_timeout)
            .build()?;
        Ok(Self {
            client,
            default_timeout,
        })
    }

    /// Probes every slot. Never fails: problems surface as `ok = false`.
    ///
    /// Slots sharing provider, endpoint and key reuse one catalog request.
    pub async fn check(&self, slots: &[(ProfileSlot, &LlmModelConfig)]) -> Vec<SlotHealth> {
        let mut catalogs: Vec<((LlmProvider, &str, Option<&str>), Catalog)> = Vec::new();
        let mut out = Vec::with_capacity(slots.len());

        for &(slot, cfg) in slots {
            let key = (cfg.provider, cfg.endpoint.as_str(), cfg.api_key.as_deref());
            let idx = match catalogs.iter().position(|(k, _)| *k == key) {
                Some(i) => i,
                None => {
                    catalogs.push((key, self.fetch_catalog(cfg).await));
                    catalogs.len() - 1
                }
            };

            let health = assess(slot, cfg, &catalogs[idx].1);
            if health.ok {
                debug!(slot = ?slot, model = %health.model, latency_ms = health.latency_ms, "profile healthy");
            } else {
                warn!(
                    slot = ?slot,
                    provider = %health.provider,
                    model = %health.model,
                    message = %health.message,
                    "profile unhealthy"
                );
            }
            out.push(health);
        }

        info!(
            slots = out.len(),
            catalogs = catalogs.len(),
            healthy = out.iter().filter(|h| h.ok).count(),
            "health probes finished"
        );
        out
    }

    async fn fetch_catalog(&self, cfg: &LlmModelConfig) -> Catalog {
        let start = Instant::now();
        let listing = self.list_models(cfg).await.map_err(|e| e.to_string());
        Catalog {
            latency_ms: start.elapsed().as_millis(),
            listing,
        }
    }

    async fn list_models(&self, cfg: &LlmModelConfig) -> Result<Vec<ListedModel>, AiLlmError> {
        let base = cfg.endpoint.trim_end_matches('/');
        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout);

        let request = match cfg.provider {
            LlmProvider::Ollama => self.client.get(format!("{base}/api/tags")),
            LlmProvider::Cohere => {
                let key = cfg
                    .api_key
                    .as_deref()
                    .ok_or(ConfigError::MissingVar("COHERE_API_KEY"))?;
                self.client
                    .get(format!("{base}/v1/models"))
                    .query(&[("page_size", "1000")])
                    .bearer_auth(key)
            }
        };

        let resp = request.timeout(timeout).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let url = resp.url().to_string();
            let snippet = make_snippet(&resp.text().await.unwrap_or_default());
            return Err(HealthError::HttpStatus(HttpError {
                status,
                url,
                snippet,
            })
            .into());
        }

        let list: ModelList = resp
            .json()
            .await
            .map_err(|e| HealthError::Decode(e.to_string()))?;
        Ok(list.models)
    }
}

//! Adaptive two-phase retrieval and the `answer_query` entry point.
//!
//! ```text
//! PRIMARY_SEARCH -> sufficient? -> DONE
//!                -> EXPANSION_SEARCH -> MERGE -> DONE
//! ```
//!
//! Only input and configuration errors leave [`RetrievalPipeline::answer_query`]
//! as `Err`. Every port failure is absorbed by the component that owns the call.

use std::sync::Arc;
use std::time::Instant;

use ai_llm_service::CredentialStatus;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::aggregator::ResultAggregator;
use crate::cfg::PipelineConfig;
use crate::embedding::EmbeddingAccess;
use crate::error::PipelineError;
use crate::expander::QueryExpander;
use crate::ports::{EmbeddingKind, EmbeddingPort, GeneratorPort, RerankPort, VectorIndexPort};
use crate::prompt::preview;
use crate::reranker::Reranker;
use crate::synthesizer::AnswerSynthesizer;
use crate::types::{
    AnswerOptions, AnswerResponse, AnswerResult, ExpansionStatus, Hit, QueryExpansion, RoundOrigin,
    SearchMethod, SourcePreview,
};

pub const NO_DOCUMENTS_MESSAGE: &str =
    "No documents have been uploaded yet. Please upload some PDF documents first.";
pub const NO_RELEVANT_INFORMATION_MESSAGE: &str =
    "I couldn't find any relevant information for your query.";

/// The four collaborators, shared read-only across requests.
#[derive(Clone)]
pub struct PipelinePorts {
    pub embedding: Arc<dyn EmbeddingPort>,
    pub index: Arc<dyn VectorIndexPort>,
    pub rerank: Arc<dyn RerankPort>,
    pub generator: Arc<dyn GeneratorPort>,
}

/// Hits produced by adaptive search, with the expansion record.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub hits: Vec<Hit>,
    pub expansion: QueryExpansion,
}

#[derive(Clone)]
pub struct RetrievalPipeline {
    cfg: PipelineConfig,
    embeddings: EmbeddingAccess,
    index: Arc<dyn VectorIndexPort>,
    expander: QueryExpander,
    reranker: Reranker,
    synthesizer: AnswerSynthesizer,
    readiness: CredentialStatus,
}

impl RetrievalPipeline {
    /// Builds a pipeline that assumes valid credentials.
    pub fn new(ports: PipelinePorts, cfg: PipelineConfig) -> Self {
        Self {
            embeddings: EmbeddingAccess::new(ports.embedding),
            index: ports.index,
            expander: QueryExpander::new(ports.generator.clone(), &cfg),
            reranker: Reranker::new(ports.rerank, &cfg),
            synthesizer: AnswerSynthesizer::new(ports.generator, &cfg),
            readiness: CredentialStatus::valid(),
            cfg,
        }
    }

    /// Attaches the credential check done when the providers were built.
    /// An invalid status makes every query fail with a configuration error.
    pub fn with_readiness(mut self, readiness: CredentialStatus) -> Self {
        self.readiness = readiness;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    pub fn readiness(&self) -> &CredentialStatus {
        &self.readiness
    }

    /// Answers `query` from the indexed corpus.
    ///
    /// # Errors
    /// - [`PipelineError::Input`] for an empty or whitespace-only query.
    /// - [`PipelineError::Configuration`] when provider credentials are invalid.
    pub async fn answer_query(
        &self,
        query: &str,
        opts: AnswerOptions,
    ) -> Result<AnswerResponse, PipelineError> {
        let started = Instant::now();
        let query = query.trim();
        if query.is_empty() {
            return Err(PipelineError::Input("query is required".into()));
        }
        if !self.readiness.is_valid {
            let reason = self
                .readiness
                .error
                .clone()
                .unwrap_or_else(|| "provider credentials are invalid".into());
            return Err(PipelineError::Configuration(reason));
        }

        if !self.corpus_exists().await {
            info!(target: "rag_pipeline::pipeline", "no documents indexed");
            return Ok(AnswerResponse::NoDocuments {
                message: NO_DOCUMENTS_MESSAGE.to_string(),
            });
        }

        let (hits, expansion, method) = if opts.use_expansion {
            let outcome = self.adaptive_search(query).await;
            let hits = if opts.use_reranking && !outcome.hits.is_empty() {
                self.reranker.rerank(outcome.hits, query).await
            } else {
                outcome.hits
            };
            (hits, Some(outcome.expansion), SearchMethod::Enhanced)
        } else {
            (self.basic_search(query).await, None, SearchMethod::Basic)
        };

        if hits.is_empty() {
            info!(
                target: "rag_pipeline::pipeline",
                method = ?method,
                latency_ms = started.elapsed().as_millis() as u64,
                "no relevant hits"
            );
            return Ok(AnswerResponse::NoRelevantInformation {
                message: NO_RELEVANT_INFORMATION_MESSAGE.to_string(),
                search_method: method,
                expansion,
            });
        }

        let context_len = hits.len().min(self.cfg.context_hits);
        let answer = self.synthesizer.synthesize(query, &hits[..context_len]).await;
        let sources = hits.iter().map(|h| self.source_preview(h)).collect();
        let reranking_applied = opts.use_expansion && opts.use_reranking;

        info!(
            target: "rag_pipeline::pipeline",
            method = ?method,
            hits = hits.len(),
            reranking_applied,
            latency_ms = started.elapsed().as_millis() as u64,
            "query answered"
        );

        Ok(AnswerResponse::Answered(AnswerResult {
            answer,
            sources,
            expansion,
            search_method: method,
            reranking_applied,
        }))
    }

    /// Primary search, then expansion search when the primary round is weak.
    ///
    /// Returns at most `top_k` hits sorted by raw score.
    pub async fn adaptive_search(&self, query: &str) -> SearchOutcome {
        let k = self.cfg.top_k;
        let mut agg = ResultAggregator::new();

        let primary = self
            .search_text(query, k.saturating_mul(2), RoundOrigin::Primary)
            .await;
        agg.append(primary);

        let good = agg
            .hits()
            .iter()
            .filter(|h| h.raw_score > self.cfg.relevance_floor)
            .count();
        debug!(
            target: "rag_pipeline::pipeline",
            primary = agg.len(),
            good,
            "primary round done"
        );

        if good >= self.cfg.min_good_hits {
            return SearchOutcome {
                hits: agg.into_top(k),
                expansion: QueryExpansion::original_only(query, ExpansionStatus::Skipped),
            };
        }

        let expansion = self.expander.expand(query).await;
        let terms: Vec<String> = expansion
            .expanded_terms
            .iter()
            .take(self.cfg.expansion_search_terms)
            .cloned()
            .collect();

        let rounds = join_all(
            terms
                .iter()
                .enumerate()
                .map(|(i, term)| self.search_text(term, k, RoundOrigin::Expanded(i))),
        )
        .await;

        for round in rounds {
            agg.append(round);
        }
        debug!(
            target: "rag_pipeline::pipeline",
            rounds = terms.len(),
            merged = agg.len(),
            "expansion rounds merged"
        );

        SearchOutcome {
            hits: agg.into_top(k),
            expansion,
        }
    }

    /// Single search without expansion or reranking.
    pub async fn basic_search(&self, query: &str) -> Vec<Hit> {
        let limit = self.cfg.basic_limit;
        let mut agg = ResultAggregator::new();
        agg.append(self.search_text(query, limit, RoundOrigin::Primary).await);
        agg.into_top(limit)
    }

    async fn corpus_exists(&self) -> bool {
        match self.index.exists().await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(target: "rag_pipeline::pipeline", error = %e, "index existence probe failed; treating corpus as empty");
                false
            }
        }
    }

    /// Embeds `text` and searches. Any failure yields an empty round.
    async fn search_text(&self, text: &str, limit: usize, origin: RoundOrigin) -> Vec<Hit> {
        let vector = self.embeddings.embed_one(text, EmbeddingKind::Query).await;
        if vector.is_empty() {
            return Vec::new();
        }
        match self.index.search(&vector, limit).await {
            Ok(hits) => hits
                .into_iter()
                .map(|mut h| {
                    h.origin = origin;
                    h.reranked_score = None;
                    h
                })
                .collect(),
            Err(e) => {
                warn!(target: "rag_pipeline::pipeline", error = %e, ?origin, "vector search failed");
                Vec::new()
            }
        }
    }

    fn source_preview(&self, hit: &Hit) -> SourcePreview {
        SourcePreview {
            file: hit.chunk.source.clone(),
            chunk: hit.chunk.sequence,
            score: hit.effective_score(),
            original_score: hit.raw_score,
            preview: preview(&hit.chunk.text, self.cfg.preview_chars),
        }
    }
}

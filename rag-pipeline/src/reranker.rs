//! Reranking with truncation and score fusion.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cfg::PipelineConfig;
use crate::ports::RerankPort;
use crate::prompt::rerank_document;
use crate::types::Hit;

/// Wraps a [`RerankPort`]. Never fails.
#[derive(Clone)]
pub struct Reranker {
    port: Arc<dyn RerankPort>,
    doc_chars: usize,
    neutral_score: f32,
}

impl Reranker {
    pub fn new(port: Arc<dyn RerankPort>, cfg: &PipelineConfig) -> Self {
        Self {
            port,
            doc_chars: cfg.rerank_doc_chars,
            neutral_score: cfg.neutral_rerank_score,
        }
    }

    /// Scores every hit and sorts by `reranked_score`, highest first (stable).
    ///
    /// A hit the port did not score keeps its raw score. When the port fails,
    /// every hit gets the neutral score and the input order is kept.
    pub async fn rerank(&self, mut hits: Vec<Hit>, query: &str) -> Vec<Hit> {
        if hits.is_empty() {
            return hits;
        }

        let documents: Vec<String> = hits
            .iter()
            .map(|h| rerank_document(h, self.doc_chars))
            .collect();

        match self.port.rerank(query, &documents, documents.len()).await {
            Ok(scores) => {
                let mut by_index = HashMap::with_capacity(scores.len());
                for s in scores {
                    if s.index < hits.len() && s.relevance_score.is_finite() {
                        by_index.entry(s.index).or_insert(s.relevance_score);
                    }
                }
                for (i, hit) in hits.iter_mut().enumerate() {
                    hit.reranked_score = Some(by_index.get(&i).copied().unwrap_or(hit.raw_score));
                }
                hits.sort_by(|a, b| b.effective_score().total_cmp(&a.effective_score()));
                debug!(
                    target: "rag_pipeline::reranker",
                    hits = hits.len(),
                    scored = by_index.len(),
                    "reranked"
                );
            }
            Err(e) => {
                warn!(target: "rag_pipeline::reranker", error = %e, "rerank failed; assigning neutral scores");
                for hit in hits.iter_mut() {
                    hit.reranked_score = Some(self.neutral_score);
                }
            }
        }
        hits
    }
}

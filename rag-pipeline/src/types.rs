//! Domain types shared by the pipeline and its callers (e.g., the HTTP API layer).

use serde::{Deserialize, Serialize};

/// The atomic retrievable unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// Unique within the index.
    pub id: String,
    /// Never empty.
    pub text: String,
    /// Origin document identifier.
    pub source: String,
    /// 0-based position within `source`.
    pub sequence: usize,
    pub source_chunk_count: usize,
}

/// Which retrieval round surfaced a hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOrigin {
    Primary,
    /// Index into the expansion terms that were searched.
    Expanded(usize),
}

/// A chunk surfaced by a retrieval round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hit {
    pub chunk: Chunk,
    /// Vector similarity; higher is more relevant.
    pub raw_score: f32,
    /// Set only by reranking.
    pub reranked_score: Option<f32>,
    pub origin: RoundOrigin,
}

impl Hit {
    pub fn new(chunk: Chunk, raw_score: f32, origin: RoundOrigin) -> Self {
        Self {
            chunk,
            raw_score,
            reranked_score: None,
            origin,
        }
    }

    /// Reranked score when present, raw score otherwise.
    pub fn effective_score(&self) -> f32 {
        self.reranked_score.unwrap_or(self.raw_score)
    }
}

/// How the expansion record came about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionStatus {
    /// Primary results were sufficient; the generator was not called.
    Skipped,
    /// Terms were parsed from a generator response.
    Generated,
    /// The generator failed; only the original query is present.
    Degraded,
}

/// Result of query expansion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryExpansion {
    pub original_query: String,
    /// Original query first, then generated terms; no duplicates.
    pub expanded_terms: Vec<String>,
    /// Original query plus expansion terms, for observability.
    pub search_context: String,
    pub status: ExpansionStatus,
}

impl QueryExpansion {
    /// Record that carries only the original query.
    pub fn original_only(query: &str, status: ExpansionStatus) -> Self {
        Self {
            original_query: query.to_string(),
            expanded_terms: vec![query.to_string()],
            search_context: query.to_string(),
            status,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    Basic,
    Enhanced,
}

/// A hit condensed for display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcePreview {
    pub file: String,
    pub chunk: usize,
    /// Reranked score if present, raw score otherwise.
    pub score: f32,
    pub original_score: f32,
    pub preview: String,
}

/// A synthesized answer with its supporting sources.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub answer: String,
    pub sources: Vec<SourcePreview>,
    pub expansion: Option<QueryExpansion>,
    pub search_method: SearchMethod,
    pub reranking_applied: bool,
}

/// Outcome of a well-formed query. Exactly one variant per request.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AnswerResponse {
    /// Nothing was ever indexed.
    NoDocuments { message: String },
    /// Retrieval found nothing usable.
    #[serde(rename_all = "camelCase")]
    NoRelevantInformation {
        message: String,
        search_method: SearchMethod,
        expansion: Option<QueryExpansion>,
    },
    Answered(AnswerResult),
}

impl AnswerResponse {
    pub fn answer_text(&self) -> &str {
        match self {
            AnswerResponse::NoDocuments { message }
            | AnswerResponse::NoRelevantInformation { message, .. } => message,
            AnswerResponse::Answered(r) => &r.answer,
        }
    }
}

/// Per-request switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOptions {
    pub use_expansion: bool,
    pub use_reranking: bool,
}

impl Default for AnswerOptions {
    fn default() -> Self {
        Self {
            use_expansion: true,
            use_reranking: true,
        }
    }
}

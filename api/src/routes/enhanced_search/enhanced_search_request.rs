use rag_pipeline::{AnswerOptions, AnswerResponse, QueryExpansion, SearchMethod, SourcePreview};
use serde::{Deserialize, Serialize};

fn yes() -> bool {
    true
}

/// Request payload for /enhanced_search.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedSearchRequest {
    /// Natural language question. Missing and blank are both rejected.
    #[serde(default)]
    pub query: Option<String>,
    /// `false` runs a single basic search without expansion or reranking.
    #[serde(default = "yes")]
    pub use_enhanced_search: bool,
    #[serde(default = "yes")]
    pub reranking_enabled: bool,
}

impl EnhancedSearchRequest {
    pub fn options(&self) -> AnswerOptions {
        AnswerOptions {
            use_expansion: self.use_enhanced_search,
            use_reranking: self.reranking_enabled,
        }
    }
}

/// Response payload for /enhanced_search.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedSearchResponse {
    pub answer: String,
    pub query: String,
    /// `answered`, `no_documents` or `no_relevant_information`.
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_expansion: Option<QueryExpansion>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourcePreview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_method: Option<SearchMethod>,
    pub reranking_applied: bool,
}

impl EnhancedSearchResponse {
    pub fn new(query: &str, resp: AnswerResponse) -> Self {
        let query = query.to_string();
        match resp {
            AnswerResponse::NoDocuments { message } => Self {
                answer: message,
                query,
                outcome: "no_documents",
                query_expansion: None,
                sources: Vec::new(),
                search_method: None,
                reranking_applied: false,
            },
            AnswerResponse::NoRelevantInformation {
                message,
                search_method,
                expansion,
            } => Self {
                answer: message,
                query,
                outcome: "no_relevant_information",
                query_expansion: expansion,
                sources: Vec::new(),
                search_method: Some(search_method),
                reranking_applied: false,
            },
            AnswerResponse::Answered(r) => Self {
                answer: r.answer,
                query,
                outcome: "answered",
                query_expansion: r.expansion,
                sources: r.sources,
                search_method: Some(r.search_method),
                reranking_applied: r.reranking_applied,
            },
        }
    }
}

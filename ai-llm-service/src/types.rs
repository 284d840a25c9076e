//! Request/response shapes shared by all providers.

use serde::{Deserialize, Serialize};

/// What an embedding will be used for.
///
/// Providers that distinguish query and document vectors (Cohere's
/// `input_type`) get the matching hint; others ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedPurpose {
    Query,
    Document,
}

impl EmbedPurpose {
    /// Cohere `input_type` value.
    pub fn cohere_input_type(self) -> &'static str {
        match self {
            EmbedPurpose::Query => "search_query",
            EmbedPurpose::Document => "search_document",
        }
    }
}

/// Per-call generation overrides. `None` falls back to the profile defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerateOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl GenerateOptions {
    pub fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens: Some(max_tokens),
            temperature: Some(temperature),
        }
    }
}

/// One scored document returned by a rerank call.
///
/// `index` points into the `documents` slice that was sent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RerankHit {
    pub index: usize,
    pub relevance_score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_type_matches_cohere_names() {
        assert_eq!(EmbedPurpose::Query.cohere_input_type(), "search_query");
        assert_eq!(EmbedPurpose::Document.cohere_input_type(), "search_document");
    }

    #[test]
    fn default_options_defer_to_profile() {
        let o = GenerateOptions::default();
        assert!(o.max_tokens.is_none());
        assert!(o.temperature.is_none());
        assert_eq!(GenerateOptions::new(150, 0.3).max_tokens, Some(150));
    }
}

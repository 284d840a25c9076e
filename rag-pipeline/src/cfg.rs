//! Runtime configuration loaded from environment variables.

use std::str::FromStr;

use crate::error::PipelineError;

/// Knobs for retrieval, expansion, reranking and synthesis.
///
/// All fields have defaults; `from_env` overrides them from `RAG_*` variables.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    /// Final result size `K`; the primary round fetches `2 * top_k`.
    pub top_k: usize,
    /// A primary hit is "good" when `raw_score > relevance_floor`.
    pub relevance_floor: f32,
    /// Expansion is skipped when at least this many primary hits are good.
    pub min_good_hits: usize,
    /// How many expansion terms are embedded and searched.
    pub expansion_search_terms: usize,
    /// Cap on the expansion list, original query included.
    pub max_expansion_terms: usize,
    /// Generated terms with this many characters or more are dropped.
    pub max_term_chars: usize,
    pub expansion_max_tokens: u32,
    pub expansion_temperature: f32,
    /// Domain hint placed in the expansion prompt.
    pub corpus_domain: String,
    /// Text characters sent per rerank document.
    pub rerank_doc_chars: usize,
    /// Score given to every hit when the reranker fails.
    pub neutral_rerank_score: f32,
    pub preview_chars: usize,
    /// Hits whose text goes into the answer context.
    pub context_hits: usize,
    /// Hits previewed in the degraded answer.
    pub fallback_preview_hits: usize,
    pub answer_max_tokens: u32,
    pub answer_temperature: f32,
    /// Result size of basic (non-adaptive) search.
    pub basic_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            relevance_floor: 0.3,
            min_good_hits: 5,
            expansion_search_terms: 3,
            max_expansion_terms: 10,
            max_term_chars: 50,
            expansion_max_tokens: 150,
            expansion_temperature: 0.3,
            corpus_domain: "CVs/resumes".to_string(),
            rerank_doc_chars: 1000,
            neutral_rerank_score: 0.5,
            preview_chars: 150,
            context_hits: 5,
            fallback_preview_hits: 3,
            answer_max_tokens: 500,
            answer_temperature: 0.1,
            basic_limit: 5,
        }
    }
}

impl PipelineConfig {
    /// Build from environment variables on top of [`Default`].
    ///
    /// # Errors
    /// [`PipelineError::Configuration`] when a variable is set but does not
    /// parse, or when the resulting config fails [`Self::validate`].
    pub fn from_env() -> Result<Self, PipelineError> {
        let d = Self::default();
        let cfg = Self {
            top_k: parse("RAG_TOP_K", d.top_k)?,
            relevance_floor: parse("RAG_RELEVANCE_FLOOR", d.relevance_floor)?,
            min_good_hits: parse("RAG_MIN_GOOD_HITS", d.min_good_hits)?,
            expansion_search_terms: parse("RAG_EXPANSION_SEARCH_TERMS", d.expansion_search_terms)?,
            max_expansion_terms: parse("RAG_MAX_EXPANSION_TERMS", d.max_expansion_terms)?,
            max_term_chars: parse("RAG_MAX_TERM_CHARS", d.max_term_chars)?,
            expansion_max_tokens: d.expansion_max_tokens,
            expansion_temperature: d.expansion_temperature,
            corpus_domain: env("RAG_CORPUS_DOMAIN", &d.corpus_domain),
            rerank_doc_chars: parse("RAG_RERANK_DOC_CHARS", d.rerank_doc_chars)?,
            neutral_rerank_score: parse("RAG_NEUTRAL_RERANK_SCORE", d.neutral_rerank_score)?,
            preview_chars: parse("RAG_PREVIEW_CHARS", d.preview_chars)?,
            context_hits: parse("RAG_CONTEXT_HITS", d.context_hits)?,
            fallback_preview_hits: parse("RAG_FALLBACK_PREVIEW_HITS", d.fallback_preview_hits)?,
            answer_max_tokens: d.answer_max_tokens,
            answer_temperature: d.answer_temperature,
            basic_limit: parse("RAG_BASIC_LIMIT", d.basic_limit)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        let fail = |m: &str| Err(PipelineError::Configuration(m.to_string()));
        if self.top_k == 0 {
            return fail("RAG_TOP_K must be > 0");
        }
        if !(0.0..=1.0).contains(&self.relevance_floor) {
            return fail("RAG_RELEVANCE_FLOOR must be within 0.0..=1.0");
        }
        if self.max_expansion_terms == 0 {
            return fail("RAG_MAX_EXPANSION_TERMS must be > 0");
        }
        if self.max_term_chars == 0 {
            return fail("RAG_MAX_TERM_CHARS must be > 0");
        }
        if self.rerank_doc_chars == 0 || self.preview_chars == 0 {
            return fail("RAG_RERANK_DOC_CHARS and RAG_PREVIEW_CHARS must be > 0");
        }
        if self.context_hits == 0 {
            return fail("RAG_CONTEXT_HITS must be > 0");
        }
        if !self.neutral_rerank_score.is_finite() {
            return fail("RAG_NEUTRAL_RERANK_SCORE must be finite");
        }
        if self.basic_limit == 0 {
            return fail("RAG_BASIC_LIMIT must be > 0");
        }
        Ok(())
    }
}

fn env(k: &str, dflt: &str) -> String {
    std::env::var(k)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| dflt.to_string())
}

fn parse<T: FromStr>(k: &str, dflt: T) -> Result<T, PipelineError> {
    match std::env::var(k) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map_err(|_| PipelineError::Configuration(format!("{k} has an invalid value: {v}"))),
        _ => Ok(dflt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = PipelineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.top_k, 10);
        assert_eq!(cfg.min_good_hits, 5);
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let cfg = PipelineConfig {
            top_k: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(PipelineError::Configuration(_))));
    }

    #[test]
    fn floor_outside_unit_range_is_rejected() {
        let cfg = PipelineConfig {
            relevance_floor: 1.5,
            ..PipelineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}

//! Query expansion through the generator port.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cfg::PipelineConfig;
use crate::ports::GeneratorPort;
use crate::prompt::build_expansion_prompt;
use crate::types::{ExpansionStatus, QueryExpansion};

/// Produces related search terms for weak queries. Never fails.
#[derive(Clone)]
pub struct QueryExpander {
    generator: Arc<dyn GeneratorPort>,
    corpus_domain: String,
    max_terms: usize,
    max_term_chars: usize,
    max_tokens: u32,
    temperature: f32,
}

impl QueryExpander {
    pub fn new(generator: Arc<dyn GeneratorPort>, cfg: &PipelineConfig) -> Self {
        Self {
            generator,
            corpus_domain: cfg.corpus_domain.clone(),
            max_terms: cfg.max_expansion_terms,
            max_term_chars: cfg.max_term_chars,
            max_tokens: cfg.expansion_max_tokens,
            temperature: cfg.expansion_temperature,
        }
    }

    /// Expands `query`. On generator failure the record holds only the query.
    pub async fn expand(&self, query: &str) -> QueryExpansion {
        let prompt = build_expansion_prompt(query, &self.corpus_domain, self.max_terms);
        match self
            .generator
            .complete(&prompt, self.max_tokens, self.temperature)
            .await
        {
            Ok(raw) => {
                let terms = parse_terms(query, &raw, self.max_terms, self.max_term_chars);
                debug!(
                    target: "rag_pipeline::expander",
                    terms = terms.len(),
                    "query expanded"
                );
                let search_context = terms.join(" ");
                QueryExpansion {
                    original_query: query.to_string(),
                    expanded_terms: terms,
                    search_context,
                    status: ExpansionStatus::Generated,
                }
            }
            Err(e) => {
                warn!(target: "rag_pipeline::expander", error = %e, "query expansion failed; using original query");
                QueryExpansion::original_only(query, ExpansionStatus::Degraded)
            }
        }
    }
}

/// Turns a comma-separated generator response into the expansion list.
///
/// Terms are trimmed (quotes included), empty ones and ones with
/// `max_term_chars` characters or more are dropped. The original query is
/// always first and exempt from the length rule. Duplicates are removed
/// case-insensitively, keeping the first occurrence, and the whole list is
/// capped at `max_terms` entries.
pub fn parse_terms(query: &str, raw: &str, max_terms: usize, max_term_chars: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(max_terms);

    seen.insert(query.to_lowercase());
    out.push(query.to_string());

    let candidates = raw
        .split(',')
        .map(|t| t.trim().trim_matches(|c: char| c == '"' || c == '\'').trim())
        .filter(|t| !t.is_empty() && t.chars().count() < max_term_chars);

    for term in candidates {
        if out.len() >= max_terms {
            break;
        }
        if seen.insert(term.to_lowercase()) {
            out.push(term.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PortError, PortKind};
    use crate::ports::PortFuture;
    use std::sync::Mutex;

    struct ScriptedGenerator {
        reply: Result<String, PortError>,
        prompts: Mutex<Vec<(String, u32, f32)>>,
    }

    impl GeneratorPort for ScriptedGenerator {
        fn complete<'a>(&'a self, prompt: &'a str, max_tokens: u32, temperature: f32) -> PortFuture<'a, String> {
            if let Ok(mut p) = self.prompts.lock() {
                p.push((prompt.to_string(), max_tokens, temperature));
            }
            let r = self.reply.clone();
            Box::pin(async move { r })
        }
    }

    fn expander(reply: Result<String, PortError>) -> (QueryExpander, Arc<ScriptedGenerator>) {
        let g = Arc::new(ScriptedGenerator {
            reply,
            prompts: Mutex::new(Vec::new()),
        });
        (QueryExpander::new(g.clone(), &PipelineConfig::default()), g)
    }

    #[test]
    fn original_first_and_deduplicated() {
        let terms = parse_terms("java", "Java, backend, spring boot, backend , ", 10, 50);
        assert_eq!(terms, vec!["java", "backend", "spring boot"]);
    }

    #[test]
    fn long_and_empty_terms_are_dropped() {
        let long = "x".repeat(50);
        let raw = format!("ok,,{long}, {}", "y".repeat(49));
        let terms = parse_terms("q", &raw, 10, 50);
        assert_eq!(terms.len(), 3);
        assert!(terms.iter().skip(1).all(|t| t.chars().count() < 50));
    }

    #[test]
    fn list_is_capped_including_query() {
        let raw = (0..20).map(|i| format!("t{i}")).collect::<Vec<_>>().join(",");
        let terms = parse_terms("q", &raw, 10, 50);
        assert_eq!(terms.len(), 10);
        assert_eq!(terms[0], "q");
        assert_eq!(terms[9], "t8");
    }

    #[test]
    fn long_query_is_kept() {
        let q = "z".repeat(80);
        assert_eq!(parse_terms(&q, "", 10, 50), vec![q]);
    }

    #[tokio::test]
    async fn generated_expansion_uses_configured_sampling() {
        let (x, g) = expander(Ok("java, backend, spring boot".into()));
        let e = x.expand("java developer").await;
        assert_eq!(e.status, ExpansionStatus::Generated);
        assert_eq!(e.expanded_terms, vec!["java developer", "java", "backend", "spring boot"]);
        assert_eq!(e.search_context, "java developer java backend spring boot");

        let calls = g.prompts.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, 150);
        assert!((calls[0].2 - 0.3).abs() < f32::EPSILON);
        assert!(calls[0].0.contains("\"java developer\""));
    }

    #[tokio::test]
    async fn generator_failure_degrades_to_query() {
        let (x, _) = expander(Err(PortError::unavailable(PortKind::Generator, "timeout")));
        let e = x.expand("rust").await;
        assert_eq!(e.status, ExpansionStatus::Degraded);
        assert_eq!(e.expanded_terms, vec!["rust"]);
        assert_eq!(e.search_context, "rust");
    }
}

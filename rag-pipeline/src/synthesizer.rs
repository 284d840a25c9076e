//! Final answer generation over the retrieved context.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cfg::PipelineConfig;
use crate::ports::GeneratorPort;
use crate::prompt::{DEGRADED_ANSWER_HEADER, EMPTY_ANSWER, build_answer_prompt, build_context, preview};
use crate::types::Hit;

/// Turns context hits into an answer. Never fails.
#[derive(Clone)]
pub struct AnswerSynthesizer {
    generator: Arc<dyn GeneratorPort>,
    max_tokens: u32,
    temperature: f32,
    preview_chars: usize,
    fallback_hits: usize,
}

impl AnswerSynthesizer {
    pub fn new(generator: Arc<dyn GeneratorPort>, cfg: &PipelineConfig) -> Self {
        Self {
            generator,
            max_tokens: cfg.answer_max_tokens,
            temperature: cfg.answer_temperature,
            preview_chars: cfg.preview_chars,
            fallback_hits: cfg.fallback_preview_hits,
        }
    }

    /// Answers `query` from `context_hits`, which the caller has already cut
    /// to the context size.
    ///
    /// If the generator fails, the answer is an apology followed by previews
    /// of the leading hits.
    pub async fn synthesize(&self, query: &str, context_hits: &[Hit]) -> String {
        let context = build_context(context_hits);
        let prompt = build_answer_prompt(query, &context);

        match self
            .generator
            .complete(&prompt, self.max_tokens, self.temperature)
            .await
        {
            Ok(text) => {
                let answer = text.trim();
                debug!(target: "rag_pipeline::synthesizer", answer_len = answer.len(), "answer generated");
                if answer.is_empty() {
                    EMPTY_ANSWER.to_string()
                } else {
                    answer.to_string()
                }
            }
            Err(e) => {
                warn!(target: "rag_pipeline::synthesizer", error = %e, "answer generation failed; returning excerpts");
                self.degraded_answer(context_hits)
            }
        }
    }

    fn degraded_answer(&self, hits: &[Hit]) -> String {
        let mut out = String::from(DEGRADED_ANSWER_HEADER);
        for hit in hits.iter().take(self.fallback_hits) {
            out.push_str("\n- ");
            out.push_str(&preview(&hit.chunk.text, self.preview_chars));
        }
        out
    }
}

//! Prompt and document builders for the generator and reranker.

use crate::types::Hit;

/// Separator between context passages in the answer prompt.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

pub const EMPTY_ANSWER: &str = "I couldn't generate an answer based on the provided context.";

pub const DEGRADED_ANSWER_HEADER: &str =
    "I couldn't generate an answer right now. These are the most relevant excerpts I found:";

/// Expansion prompt: asks for a comma-separated list of related terms.
pub fn build_expansion_prompt(query: &str, corpus_domain: &str, max_terms: usize) -> String {
    format!(
        "Given the search query: \"{query}\"\n\n\
         Generate related terms, synonyms, and associated concepts that would help find \
         relevant candidates or information in {corpus_domain}.\n\n\
         Output ONLY a comma-separated list of related terms (maximum {max_terms} terms):"
    )
}

/// Answer prompt over an already-joined context block.
pub fn build_answer_prompt(query: &str, context: &str) -> String {
    format!("Context from documents:\n{context}\n\nQuestion: {query}\n\nAnswer:")
}

/// Joins the text of `hits` into one context block.
pub fn build_context(hits: &[Hit]) -> String {
    hits.iter()
        .map(|h| h.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// Document sent to the reranker for one hit.
pub fn rerank_document(hit: &Hit, max_chars: usize) -> String {
    format!(
        "Source: {}\n\n{}",
        hit.chunk.source,
        take_chars(&hit.chunk.text, max_chars)
    )
}

/// First `max_chars` characters followed by `...`.
pub fn preview(text: &str, max_chars: usize) -> String {
    format!("{}...", take_chars(text, max_chars))
}

/// Char-boundary-safe prefix of at most `max` characters.
pub fn take_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, RoundOrigin};

    fn hit(text: &str) -> Hit {
        Hit::new(
            Chunk {
                id: "1".into(),
                text: text.into(),
                source: "cv.pdf".into(),
                sequence: 0,
                source_chunk_count: 1,
            },
            0.5,
            RoundOrigin::Primary,
        )
    }

    #[test]
    fn take_chars_respects_multibyte() {
        assert_eq!(take_chars("héllo", 2), "hé");
        assert_eq!(take_chars("abc", 10), "abc");
        assert_eq!(take_chars("", 3), "");
    }

    #[test]
    fn rerank_document_layout() {
        let long = "x".repeat(1500);
        let doc = rerank_document(&hit(&long), 1000);
        assert!(doc.starts_with("Source: cv.pdf\n\n"));
        assert_eq!(doc.len(), "Source: cv.pdf\n\n".len() + 1000);
    }

    #[test]
    fn context_uses_separator() {
        let ctx = build_context(&[hit("a"), hit("b")]);
        assert_eq!(ctx, "a\n\n---\n\nb");
    }

    #[test]
    fn answer_prompt_shape() {
        let p = build_answer_prompt("who knows rust?", "ctx");
        assert_eq!(p, "Context from documents:\nctx\n\nQuestion: who knows rust?\n\nAnswer:");
    }

    #[test]
    fn expansion_prompt_mentions_domain_and_limit() {
        let p = build_expansion_prompt("java developer", "CVs/resumes", 10);
        assert!(p.contains("\"java developer\""));
        assert!(p.contains("CVs/resumes"));
        assert!(p.contains("maximum 10 terms"));
    }
}

//! Core data models used by the library.

use serde::{Deserialize, Serialize};

/// A chunk ready to be written to Qdrant.
#[derive(Clone, Debug)]
pub struct ChunkRecord {
    /// Point id (UUID string).
    pub id: String,
    pub text: String,
    pub source: String,
    /// 0-based position within `source`.
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub vector: Vec<f32>,
}

/// A single search hit with a validated payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RagHit {
    pub id: String,
    pub score: f32,
    pub text: String,
    pub source: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

/// Payload filter; all conditions must hold.
#[derive(Clone, Debug, Default)]
pub struct RagFilter {
    /// Exact match on a field, e.g. `("source", "cv.pdf")`.
    pub equals: Vec<(String, serde_json::Value)>,
    /// Lower bound (inclusive) on an integer field.
    pub at_least: Vec<(String, i64)>,
}

impl RagFilter {
    pub fn source(source: &str) -> Self {
        Self {
            equals: vec![("source".into(), serde_json::Value::String(source.to_string()))],
            ..Default::default()
        }
    }

    /// Chunks of `source` at position `from` or later.
    pub fn source_tail(source: &str, from: usize) -> Self {
        Self {
            at_least: vec![("chunk_index".into(), from as i64)],
            ..Self::source(source)
        }
    }
}

//! Contracts the pipeline needs from its external dependencies.
//!
//! Every port returns a boxed future so implementations can be swapped behind
//! `Arc<dyn ...>`: provider-backed adapters live in [`crate::adapters`], tests
//! use in-memory fakes.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::PortError;
use crate::types::Hit;

/// Dense vector for one text. An empty vector means "no embedding".
pub type Embedding = Vec<f32>;

/// Boxed future returned by all port methods.
pub type PortFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, PortError>> + Send + 'a>>;

/// Query and document vectors are never mixed when the model distinguishes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingKind {
    Query,
    Document,
}

/// Text → vectors, positionally aligned with the input.
pub trait EmbeddingPort: Send + Sync {
    fn embed<'a>(&'a self, texts: &'a [String], kind: EmbeddingKind) -> PortFuture<'a, Vec<Embedding>>;
}

/// Nearest-neighbour search over indexed chunks.
pub trait VectorIndexPort: Send + Sync {
    /// Up to `limit` hits with payload, in descending similarity order.
    /// No score floor is applied.
    fn search<'a>(&'a self, vector: &'a [f32], limit: usize) -> PortFuture<'a, Vec<Hit>>;

    /// Whether anything was ever indexed.
    fn exists(&self) -> PortFuture<'_, bool>;
}

/// Relevance of one document, `index` pointing into the submitted list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RerankScore {
    pub index: usize,
    pub relevance_score: f32,
}

/// Secondary relevance scoring for (query, document) pairs.
pub trait RerankPort: Send + Sync {
    fn rerank<'a>(
        &'a self,
        query: &'a str,
        documents: &'a [String],
        top_n: usize,
    ) -> PortFuture<'a, Vec<RerankScore>>;
}

/// Free-text completion.
pub trait GeneratorPort: Send + Sync {
    fn complete<'a>(&'a self, prompt: &'a str, max_tokens: u32, temperature: f32) -> PortFuture<'a, String>;
}

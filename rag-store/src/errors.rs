//! Unified error types for the crate.

use thiserror::Error;

/// Top-level error for rag-store operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing / serialization errors.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Vector length differs from the collection dimension.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Record rejected before it reached Qdrant.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Source document is unknown to the repository.
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    /// Qdrant client errors (wrapped).
    #[error("qdrant error: {0}")]
    Qdrant(String),
}

impl From<qdrant_client::QdrantError> for RagError {
    fn from(e: qdrant_client::QdrantError) -> Self {
        RagError::Qdrant(e.to_string())
    }
}

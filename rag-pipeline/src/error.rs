//! Typed errors for the pipeline crate.

use thiserror::Error;

/// Which external dependency a [`PortError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    Embedding,
    VectorIndex,
    Rerank,
    Generator,
}

impl std::fmt::Display for PortKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PortKind::Embedding => "embedding",
            PortKind::VectorIndex => "vector index",
            PortKind::Rerank => "rerank",
            PortKind::Generator => "generator",
        })
    }
}

/// Failure reported by a port adapter.
///
/// Components on the answer path absorb these and degrade; only the indexer
/// propagates them.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PortError {
    /// Transport failure, timeout, or non-success status.
    #[error("{port} call failed: {message}")]
    Unavailable { port: PortKind, message: String },

    /// The call succeeded but the response had the wrong shape.
    #[error("{port} returned a malformed response: {message}")]
    Malformed { port: PortKind, message: String },

    /// Credentials or settings make the port unusable.
    #[error("{port} is misconfigured: {message}")]
    Configuration { port: PortKind, message: String },
}

impl PortError {
    pub fn unavailable(port: PortKind, message: impl Into<String>) -> Self {
        PortError::Unavailable {
            port,
            message: message.into(),
        }
    }

    pub fn malformed(port: PortKind, message: impl Into<String>) -> Self {
        PortError::Malformed {
            port,
            message: message.into(),
        }
    }

    pub fn port(&self) -> PortKind {
        match self {
            PortError::Unavailable { port, .. }
            | PortError::Malformed { port, .. }
            | PortError::Configuration { port, .. } => *port,
        }
    }
}

/// Errors surfaced to callers of the pipeline and the indexer.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Request rejected before any work (empty query, empty document).
    #[error("invalid input: {0}")]
    Input(String),

    /// Provider credentials or settings are unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Source document is not known.
    #[error("document not found: {0}")]
    NotFound(String),

    /// Indexing could not reach a dependency.
    #[error(transparent)]
    Port(#[from] PortError),

    /// Document bookkeeping failed.
    #[error("document store error: {0}")]
    Store(#[from] rag_store::RagError),
}

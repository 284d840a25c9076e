//! Runtime and collection configuration.

use std::str::FromStr;

use crate::errors::RagError;

pub const DEFAULT_COLLECTION: &str = "pdf_documents_cohere";
pub const DEFAULT_VECTOR_SIZE: usize = 1024;
pub const DEFAULT_DOCUMENT_STORE_PATH: &str = "data/documents.json";

/// Distance function used for the vector space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceKind {
    /// Cosine distance (recommended for most embeddings).
    Cosine,
    /// Dot product (useful for normalized vectors).
    Dot,
    /// Euclidean distance (L2).
    Euclid,
}

impl FromStr for DistanceKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(DistanceKind::Cosine),
            "dot" => Ok(DistanceKind::Dot),
            "euclid" | "l2" => Ok(DistanceKind::Euclid),
            other => Err(RagError::Config(format!("unknown distance: {other}"))),
        }
    }
}

/// Describes the vector space of the collection.
#[derive(Clone, Debug)]
pub struct VectorSpace {
    /// Dimensionality of vectors.
    pub size: usize,
    /// Distance function.
    pub distance: DistanceKind,
}

/// Configuration for the vector store and document bookkeeping.
#[derive(Clone, Debug)]
pub struct RagConfig {
    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    /// Optional API key for Qdrant Cloud.
    pub qdrant_api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    /// Distance function (Cosine by default).
    pub distance: DistanceKind,
    /// Embedding dimension of the collection.
    pub vector_size: usize,
    /// Upsert batch size (typical range: 128..512).
    pub upsert_batch: usize,
    /// Exact search flag (false = HNSW ANN).
    pub exact_search: bool,
    /// Where the JSON document repository lives.
    pub document_store_path: String,
}

impl RagConfig {
    /// Creates a sane default config for a given collection name and Qdrant endpoint.
    pub fn new_default(url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            qdrant_url: url.into(),
            qdrant_api_key: None,
            collection: collection.into(),
            distance: DistanceKind::Cosine,
            vector_size: DEFAULT_VECTOR_SIZE,
            upsert_batch: 256,
            exact_search: false,
            document_store_path: DEFAULT_DOCUMENT_STORE_PATH.to_string(),
        }
    }

    /// Reads the config from environment variables.
    ///
    /// - `QDRANT_URL` (default `http://localhost:6334`)
    /// - `QDRANT_API_KEY` (optional)
    /// - `QDRANT_COLLECTION` (default `pdf_documents_cohere`)
    /// - `QDRANT_DISTANCE` (default `cosine`)
    /// - `QDRANT_BATCH_SIZE` (default 256)
    /// - `QDRANT_EXACT` (default false)
    /// - `EMBEDDING_DIM` (default 1024)
    /// - `DOCUMENT_STORE_PATH` (default `data/documents.json`)
    pub fn from_env() -> Result<Self, RagError> {
        let mut cfg = Self::new_default(
            env_or("QDRANT_URL", "http://localhost:6334"),
            env_or("QDRANT_COLLECTION", DEFAULT_COLLECTION),
        );
        cfg.qdrant_api_key = env_opt("QDRANT_API_KEY");
        if let Some(d) = env_opt("QDRANT_DISTANCE") {
            cfg.distance = d.parse()?;
        }
        if let Some(n) = env_parse::<usize>("QDRANT_BATCH_SIZE")? {
            cfg.upsert_batch = n;
        }
        if let Some(b) = env_parse::<bool>("QDRANT_EXACT")? {
            cfg.exact_search = b;
        }
        if let Some(n) = env_parse::<usize>("EMBEDDING_DIM")? {
            cfg.vector_size = n;
        }
        if let Some(p) = env_opt("DOCUMENT_STORE_PATH") {
            cfg.document_store_path = p;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.qdrant_url.trim().is_empty() {
            return Err(RagError::Config("qdrant_url is empty".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(RagError::Config("collection is empty".into()));
        }
        if self.upsert_batch == 0 {
            return Err(RagError::Config("upsert_batch must be > 0".into()));
        }
        if self.vector_size == 0 {
            return Err(RagError::Config("vector_size must be > 0".into()));
        }
        Ok(())
    }

    pub fn vector_space(&self) -> VectorSpace {
        VectorSpace {
            size: self.vector_size,
            distance: self.distance,
        }
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_string())
}

fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>, RagError> {
    match env_opt(name) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| RagError::Config(format!("{name} has an invalid value: {v}"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = RagConfig::new_default("http://localhost:6334", DEFAULT_COLLECTION);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.vector_space().size, 1024);
        assert_eq!(cfg.distance, DistanceKind::Cosine);
    }

    #[test]
    fn rejects_empty_collection_and_zero_dim() {
        let mut cfg = RagConfig::new_default("http://localhost:6334", " ");
        assert!(cfg.validate().is_err());
        cfg.collection = "c".into();
        cfg.vector_size = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn distance_parses_aliases() {
        assert_eq!("L2".parse::<DistanceKind>().unwrap(), DistanceKind::Euclid);
        assert!("manhattan".parse::<DistanceKind>().is_err());
    }
}

//! Vector store facade over Qdrant plus document bookkeeping.
//!
//! This crate provides:
//! - [`RagStore`]: collection probe, similarity search with validated payloads,
//!   chunk upsert and delete-by-source
//! - [`documents`]: the [`DocumentRepository`] abstraction with in-memory and
//!   JSON-file implementations
//!
//! The design is flat and splits responsibilities into focused modules.

mod config;
pub mod documents;
mod errors;
mod filters;
mod ids;
mod mappers;
mod qdrant_facade;
mod record;

pub use config::{DEFAULT_COLLECTION, DEFAULT_VECTOR_SIZE, DistanceKind, RagConfig, VectorSpace};
pub use documents::{
    DocumentRepository, InMemoryDocuments, JsonFileDocuments, StoredChunk, StoredDocument,
};
pub use errors::RagError;
pub use ids::chunk_point_id;
pub use record::{ChunkRecord, RagFilter, RagHit};

use tracing::{debug, trace, warn};

/// High-level facade that wires configuration and Qdrant client.
///
/// This is the single entry point recommended for application code.
pub struct RagStore {
    cfg: RagConfig,
    client: qdrant_facade::QdrantFacade,
}

impl RagStore {
    /// Constructs a new store from the given configuration.
    ///
    /// # Errors
    /// Returns `RagError::Config` on invalid config, `RagError::Qdrant` if the
    /// client cannot be built.
    pub fn new(cfg: RagConfig) -> Result<Self, RagError> {
        trace!("RagStore::new collection={}", cfg.collection);
        let client = qdrant_facade::QdrantFacade::new(&cfg)?;
        Ok(Self { cfg, client })
    }

    pub fn config(&self) -> &RagConfig {
        &self.cfg
    }

    /// Whether the collection exists (i.e. anything was ever indexed).
    pub async fn collection_exists(&self) -> Result<bool, RagError> {
        self.client.collection_exists().await
    }

    /// Creates the collection with the configured vector space if missing.
    pub async fn ensure_collection(&self) -> Result<(), RagError> {
        self.client.ensure_collection(&self.cfg.vector_space()).await
    }

    /// Similarity search returning hits in descending score order.
    ///
    /// Points whose payload does not describe a valid chunk are dropped and
    /// logged; they never reach the caller.
    ///
    /// # Errors
    /// Returns `RagError::Qdrant` if search fails.
    pub async fn search(
        &self,
        query_vector: Vec<f32>,
        limit: u64,
        filter: Option<RagFilter>,
    ) -> Result<Vec<RagHit>, RagError> {
        trace!("RagStore::search limit={limit}");
        let qfilter = filter.as_ref().map(filters::to_qdrant_filter);
        let points = self
            .client
            .search(query_vector, limit, qfilter, true, self.cfg.exact_search)
            .await?;

        let mut out = Vec::with_capacity(points.len());
        for p in points {
            match mappers::scored_to_hit(p) {
                Ok(hit) => out.push(hit),
                Err(reason) => warn!(%reason, "dropping malformed point"),
            }
        }
        Ok(out)
    }

    /// Writes chunk records in batches of `upsert_batch`.
    ///
    /// Every vector must match the configured dimension.
    pub async fn upsert_chunks(&self, records: Vec<ChunkRecord>) -> Result<usize, RagError> {
        if let Some(bad) = records.iter().find(|r| r.vector.len() != self.cfg.vector_size) {
            return Err(RagError::VectorSizeMismatch {
                got: bad.vector.len(),
                want: self.cfg.vector_size,
            });
        }

        let mut written = 0;
        let mut points: Vec<_> = records.into_iter().map(mappers::chunk_to_point).collect();
        while !points.is_empty() {
            let rest = points.split_off(points.len().min(self.cfg.upsert_batch));
            written += self.client.upsert_points(points).await?;
            points = rest;
        }
        debug!(written, collection = %self.cfg.collection, "chunks upserted");
        Ok(written)
    }

    /// Deletes all points whose payload `source` equals `source`.
    pub async fn delete_source(&self, source: &str) -> Result<(), RagError> {
        if !self.collection_exists().await? {
            return Ok(());
        }
        let filter = filters::to_qdrant_filter(&RagFilter::source(source));
        self.client.delete_by_filter(filter).await
    }

    /// Deletes the points of `source` whose `chunk_index` is `from` or higher.
    ///
    /// Used after re-indexing a document into fewer chunks.
    pub async fn delete_source_tail(&self, source: &str, from: usize) -> Result<(), RagError> {
        if !self.collection_exists().await? {
            return Ok(());
        }
        let filter = filters::to_qdrant_filter(&RagFilter::source_tail(source, from));
        self.client.delete_by_filter(filter).await
    }
}

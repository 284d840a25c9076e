//! Document indexing: chunk texts in, embedded points out.
//!
//! The indexer is the only write path. Unlike the answer path it propagates
//! port failures, since a half-indexed document is worse than a clear error.

use std::sync::Arc;

use chrono::Utc;
use rag_store::{ChunkRecord, DocumentRepository, StoredChunk, StoredDocument, chunk_point_id};
use tracing::{debug, info};

use crate::error::{PipelineError, PortError, PortKind};
use crate::ports::{EmbeddingKind, EmbeddingPort, PortFuture};

/// Default number of chunks embedded per request.
pub const DEFAULT_EMBED_BATCH: usize = 96;

/// Write side of the vector index.
pub trait ChunkSink: Send + Sync {
    /// Creates the collection if it does not exist yet.
    fn ensure_collection(&self) -> PortFuture<'_, ()>;

    /// Returns how many points were written.
    fn upsert(&self, records: Vec<ChunkRecord>) -> PortFuture<'_, usize>;

    fn delete_source<'a>(&'a self, source: &'a str) -> PortFuture<'a, ()>;

    /// Deletes the points of `source` from chunk position `from` onwards.
    fn delete_stale<'a>(&'a self, source: &'a str, from: usize) -> PortFuture<'a, ()>;
}

pub struct DocumentIndexer {
    embedding: Arc<dyn EmbeddingPort>,
    sink: Arc<dyn ChunkSink>,
    documents: Arc<dyn DocumentRepository>,
    embed_batch: usize,
}

impl DocumentIndexer {
    pub fn new(
        embedding: Arc<dyn EmbeddingPort>,
        sink: Arc<dyn ChunkSink>,
        documents: Arc<dyn DocumentRepository>,
    ) -> Self {
        Self {
            embedding,
            sink,
            documents,
            embed_batch: DEFAULT_EMBED_BATCH,
        }
    }

    pub fn with_embed_batch(mut self, n: usize) -> Self {
        self.embed_batch = n.max(1);
        self
    }

    pub fn documents(&self) -> &Arc<dyn DocumentRepository> {
        &self.documents
    }

    /// Embeds and stores the chunks of `source`, replacing any previous
    /// version of it. Blank chunks are skipped.
    ///
    /// Point ids are positional, so new chunks overwrite old ones in place;
    /// leftover old chunks are dropped only after the upsert succeeded.
    ///
    /// # Errors
    /// - [`PipelineError::Input`] for an empty source or no non-blank chunk.
    /// - [`PipelineError::Port`] when embedding or the index fails.
    pub async fn index(&self, source: &str, chunks: &[String]) -> Result<usize, PipelineError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(PipelineError::Input("filename is required".into()));
        }
        let texts: Vec<String> = chunks
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        if texts.is_empty() {
            return Err(PipelineError::Input(format!("{source} has no text chunks")));
        }

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.embed_batch) {
            let got = self.embedding.embed(batch, EmbeddingKind::Document).await?;
            if got.len() != batch.len() {
                return Err(PortError::malformed(
                    PortKind::Embedding,
                    format!("expected {} vectors, got {}", batch.len(), got.len()),
                )
                .into());
            }
            vectors.extend(got);
            debug!(target: "rag_pipeline::ingest", source, embedded = vectors.len(), "batch embedded");
        }

        let total = texts.len();
        let records: Vec<ChunkRecord> = texts
            .iter()
            .zip(vectors)
            .enumerate()
            .map(|(i, (text, vector))| ChunkRecord {
                id: chunk_point_id(source, i).to_string(),
                text: text.clone(),
                source: source.to_string(),
                chunk_index: i,
                total_chunks: total,
                vector,
            })
            .collect();
        let stored: Vec<StoredChunk> = records
            .iter()
            .map(|r| StoredChunk {
                id: r.id.clone(),
                sequence: r.chunk_index,
                text: r.text.clone(),
            })
            .collect();

        let previous = self.documents.get(source).await?.map(|d| d.chunks.len());

        self.sink.ensure_collection().await?;
        let written = self.sink.upsert(records).await?;
        if previous.is_some_and(|n| n > total) {
            self.sink.delete_stale(source, total).await?;
            debug!(target: "rag_pipeline::ingest", source, from = total, "stale chunks deleted");
        }

        self.documents
            .put(StoredDocument {
                source: source.to_string(),
                chunks: stored,
                indexed_at: Utc::now(),
            })
            .await?;

        info!(target: "rag_pipeline::ingest", source, chunks = written, "document indexed");
        Ok(written)
    }

    /// Deletes `source` from the index and the repository.
    ///
    /// # Errors
    /// [`PipelineError::NotFound`] if the source was never indexed.
    pub async fn remove(&self, source: &str) -> Result<usize, PipelineError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(PipelineError::Input("filename is required".into()));
        }
        let Some(doc) = self.documents.get(source).await? else {
            return Err(PipelineError::NotFound(source.to_string()));
        };
        self.sink.delete_source(source).await?;
        self.documents.delete(source).await?;
        info!(target: "rag_pipeline::ingest", source, chunks = doc.chunks.len(), "document removed");
        Ok(doc.chunks.len())
    }

    /// Indexed source names, ascending.
    pub async fn list(&self) -> Result<Vec<String>, PipelineError> {
        Ok(self.documents.list().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Embedding;
    use rag_store::InMemoryDocuments;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Sink {
        upserts: Mutex<Vec<ChunkRecord>>,
        deleted: Mutex<Vec<String>>,
        stale: Mutex<Vec<(String, usize)>>,
        ensured: Mutex<usize>,
        fail_upsert: std::sync::atomic::AtomicBool,
    }

    impl ChunkSink for Sink {
        fn ensure_collection(&self) -> PortFuture<'_, ()> {
            *self.ensured.lock().unwrap() += 1;
            Box::pin(async { Ok(()) })
        }
        fn upsert(&self, records: Vec<ChunkRecord>) -> PortFuture<'_, usize> {
            if self.fail_upsert.load(std::sync::atomic::Ordering::SeqCst) {
                return Box::pin(async {
                    Err(PortError::unavailable(PortKind::VectorIndex, "qdrant down"))
                });
            }
            let n = records.len();
            self.upserts.lock().unwrap().extend(records);
            Box::pin(async move { Ok(n) })
        }
        fn delete_source<'a>(&'a self, source: &'a str) -> PortFuture<'a, ()> {
            self.deleted.lock().unwrap().push(source.to_string());
            Box::pin(async { Ok(()) })
        }
        fn delete_stale<'a>(&'a self, source: &'a str, from: usize) -> PortFuture<'a, ()> {
            self.stale.lock().unwrap().push((source.to_string(), from));
            Box::pin(async { Ok(()) })
        }
    }

    struct Embedder {
        fail: bool,
        batches: Mutex<Vec<usize>>,
    }

    impl EmbeddingPort for Embedder {
        fn embed<'a>(&'a self, texts: &'a [String], kind: EmbeddingKind) -> PortFuture<'a, Vec<Embedding>> {
            assert_eq!(kind, EmbeddingKind::Document);
            self.batches.lock().unwrap().push(texts.len());
            let out = if self.fail {
                Err(PortError::unavailable(PortKind::Embedding, "down"))
            } else {
                Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
            };
            Box::pin(async move { out })
        }
    }

    fn indexer(fail: bool) -> (DocumentIndexer, Arc<Sink>, Arc<Embedder>) {
        let sink = Arc::new(Sink::default());
        let emb = Arc::new(Embedder {
            fail,
            batches: Mutex::new(Vec::new()),
        });
        let idx = DocumentIndexer::new(emb.clone(), sink.clone(), Arc::new(InMemoryDocuments::new()))
            .with_embed_batch(2);
        (idx, sink, emb)
    }

    fn chunks(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn indexes_non_blank_chunks_in_batches() {
        let (idx, sink, emb) = indexer(false);
        let n = idx.index("cv.pdf", &chunks(&["a", "  ", "bb", "ccc"])).await.unwrap();
        assert_eq!(n, 3);
        assert_eq!(*emb.batches.lock().unwrap(), vec![2, 1]);

        let ups = sink.upserts.lock().unwrap();
        assert_eq!(ups.len(), 3);
        assert_eq!(ups[2].chunk_index, 2);
        assert_eq!(ups[2].total_chunks, 3);
        assert_eq!(ups[0].id, chunk_point_id("cv.pdf", 0).to_string());
        assert_eq!(idx.list().await.unwrap(), vec!["cv.pdf".to_string()]);
    }

    #[tokio::test]
    async fn reindex_overwrites_then_trims_leftover_chunks() {
        let (idx, sink, _) = indexer(false);
        idx.index("cv.pdf", &chunks(&["a", "b", "c"])).await.unwrap();
        idx.index("cv.pdf", &chunks(&["d", "e", "f", "g"])).await.unwrap();
        assert!(sink.stale.lock().unwrap().is_empty());

        idx.index("cv.pdf", &chunks(&["h"])).await.unwrap();
        assert_eq!(*sink.stale.lock().unwrap(), vec![("cv.pdf".to_string(), 1)]);
        assert!(sink.deleted.lock().unwrap().is_empty());
        assert_eq!(idx.documents().get("cv.pdf").await.unwrap().unwrap().chunks.len(), 1);
    }

    #[tokio::test]
    async fn failed_reindex_keeps_previous_version() {
        let (idx, sink, _) = indexer(false);
        idx.index("cv.pdf", &chunks(&["a", "b", "c"])).await.unwrap();

        sink.fail_upsert.store(true, std::sync::atomic::Ordering::SeqCst);
        let err = idx.index("cv.pdf", &chunks(&["x"])).await.unwrap_err();
        assert!(matches!(err, PipelineError::Port(PortError::Unavailable { .. })));

        assert!(sink.stale.lock().unwrap().is_empty());
        assert!(sink.deleted.lock().unwrap().is_empty());
        assert_eq!(sink.upserts.lock().unwrap().len(), 3);
        let kept = idx.documents().get("cv.pdf").await.unwrap().unwrap();
        assert_eq!(kept.chunks.len(), 3);
        assert_eq!(kept.chunks[0].text, "a");
    }

    #[tokio::test]
    async fn rejects_empty_input() {
        let (idx, _, emb) = indexer(false);
        assert!(matches!(idx.index(" ", &chunks(&["a"])).await, Err(PipelineError::Input(_))));
        assert!(matches!(idx.index("cv.pdf", &chunks(&["", " "])).await, Err(PipelineError::Input(_))));
        assert!(emb.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn embedding_failure_propagates_and_stores_nothing() {
        let (idx, sink, _) = indexer(true);
        let err = idx.index("cv.pdf", &chunks(&["a"])).await.unwrap_err();
        assert!(matches!(err, PipelineError::Port(PortError::Unavailable { .. })));
        assert!(sink.upserts.lock().unwrap().is_empty());
        assert!(idx.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_known_and_unknown() {
        let (idx, sink, _) = indexer(false);
        idx.index("cv.pdf", &chunks(&["a", "b"])).await.unwrap();
        assert_eq!(idx.remove("cv.pdf").await.unwrap(), 2);
        assert_eq!(*sink.deleted.lock().unwrap(), vec!["cv.pdf".to_string()]);
        assert!(matches!(idx.remove("cv.pdf").await, Err(PipelineError::NotFound(_))));
    }
}

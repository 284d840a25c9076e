//! Port implementations over the provider profiles and the Qdrant store.

use std::sync::Arc;

use ai_llm_service::error_handler::{ProviderError, ProviderErrorKind};
use ai_llm_service::{AiLlmError, EmbedPurpose, GenerateOptions, LlmServiceProfiles};
use rag_store::{ChunkRecord, RagError, RagHit, RagStore};

use crate::error::{PortError, PortKind};
use crate::ingest::ChunkSink;
use crate::ports::{
    Embedding, EmbeddingKind, EmbeddingPort, GeneratorPort, PortFuture, RerankPort, RerankScore,
    VectorIndexPort,
};
use crate::types::{Chunk, Hit, RoundOrigin};

/// Maps a provider failure to the port taxonomy.
pub fn port_error(port: PortKind, err: AiLlmError) -> PortError {
    if err.is_config() {
        return PortError::Configuration {
            port,
            message: err.to_string(),
        };
    }
    match &err {
        AiLlmError::Provider(ProviderError {
            kind: ProviderErrorKind::Decode(_) | ProviderErrorKind::EmptyResponse,
            ..
        }) => PortError::malformed(port, err.to_string()),
        _ => PortError::unavailable(port, err.to_string()),
    }
}

fn store_error(err: RagError) -> PortError {
    match err {
        RagError::Config(m) => PortError::Configuration {
            port: PortKind::VectorIndex,
            message: m,
        },
        RagError::InvalidRecord(m) => PortError::malformed(PortKind::VectorIndex, m),
        RagError::Parse(e) => PortError::malformed(PortKind::VectorIndex, e.to_string()),
        other => PortError::unavailable(PortKind::VectorIndex, other.to_string()),
    }
}

impl From<EmbeddingKind> for EmbedPurpose {
    fn from(kind: EmbeddingKind) -> Self {
        match kind {
            EmbeddingKind::Query => EmbedPurpose::Query,
            EmbeddingKind::Document => EmbedPurpose::Document,
        }
    }
}

/// Embedding, rerank and generation backed by [`LlmServiceProfiles`].
#[derive(Clone)]
pub struct LlmPorts {
    profiles: Arc<LlmServiceProfiles>,
}

impl LlmPorts {
    pub fn new(profiles: Arc<LlmServiceProfiles>) -> Self {
        Self { profiles }
    }
}

impl EmbeddingPort for LlmPorts {
    fn embed<'a>(&'a self, texts: &'a [String], kind: EmbeddingKind) -> PortFuture<'a, Vec<Embedding>> {
        Box::pin(async move {
            self.profiles
                .embed_many(texts, kind.into())
                .await
                .map_err(|e| port_error(PortKind::Embedding, e))
        })
    }
}

impl RerankPort for LlmPorts {
    fn rerank<'a>(
        &'a self,
        query: &'a str,
        documents: &'a [String],
        top_n: usize,
    ) -> PortFuture<'a, Vec<RerankScore>> {
        Box::pin(async move {
            let hits = self
                .profiles
                .rerank(query, documents, top_n)
                .await
                .map_err(|e| port_error(PortKind::Rerank, e))?;
            Ok(hits
                .into_iter()
                .map(|h| RerankScore {
                    index: h.index,
                    relevance_score: h.relevance_score,
                })
                .collect())
        })
    }
}

impl GeneratorPort for LlmPorts {
    fn complete<'a>(&'a self, prompt: &'a str, max_tokens: u32, temperature: f32) -> PortFuture<'a, String> {
        Box::pin(async move {
            self.profiles
                .generate(prompt, GenerateOptions::new(max_tokens, temperature))
                .await
                .map_err(|e| port_error(PortKind::Generator, e))
        })
    }
}

/// Vector index backed by [`RagStore`].
#[derive(Clone)]
pub struct QdrantIndex {
    store: Arc<RagStore>,
}

impl QdrantIndex {
    pub fn new(store: Arc<RagStore>) -> Self {
        Self { store }
    }
}

pub fn hit_from_rag(hit: RagHit) -> Hit {
    Hit::new(
        Chunk {
            id: hit.id,
            text: hit.text,
            source: hit.source,
            sequence: hit.chunk_index,
            source_chunk_count: hit.total_chunks,
        },
        hit.score,
        RoundOrigin::Primary,
    )
}

impl VectorIndexPort for QdrantIndex {
    fn search<'a>(&'a self, vector: &'a [f32], limit: usize) -> PortFuture<'a, Vec<Hit>> {
        Box::pin(async move {
            let hits = self
                .store
                .search(vector.to_vec(), limit as u64, None)
                .await
                .map_err(store_error)?;
            Ok(hits.into_iter().map(hit_from_rag).collect())
        })
    }

    fn exists(&self) -> PortFuture<'_, bool> {
        Box::pin(async move { self.store.collection_exists().await.map_err(store_error) })
    }
}

impl ChunkSink for QdrantIndex {
    fn ensure_collection(&self) -> PortFuture<'_, ()> {
        Box::pin(async move { self.store.ensure_collection().await.map_err(store_error) })
    }

    fn upsert(&self, records: Vec<ChunkRecord>) -> PortFuture<'_, usize> {
        Box::pin(async move { self.store.upsert_chunks(records).await.map_err(store_error) })
    }

    fn delete_source<'a>(&'a self, source: &'a str) -> PortFuture<'a, ()> {
        Box::pin(async move { self.store.delete_source(source).await.map_err(store_error) })
    }

    fn delete_stale<'a>(&'a self, source: &'a str, from: usize) -> PortFuture<'a, ()> {
        Box::pin(async move {
            self.store
                .delete_source_tail(source, from)
                .await
                .map_err(store_error)
        })
    }
}

use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use rag_pipeline::{
    DocumentIndexer, PipelineConfig, PipelinePorts, RetrievalPipeline,
    adapters::{LlmPorts, QdrantIndex},
};
use rag_store::{DocumentRepository, JsonFileDocuments, RagConfig, RagStore};
use tracing::{info, warn};

use crate::error_handler::AppError;

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Answer path.
    pub pipeline: Arc<RetrievalPipeline>,
    /// Write path: index, remove, list.
    pub indexer: Arc<DocumentIndexer>,
    /// Provider profiles, probed by `/health`. Absent when the ports are not
    /// provider-backed.
    pub llm: Option<Arc<LlmServiceProfiles>>,
}

impl AppState {
    pub fn new(pipeline: RetrievalPipeline, indexer: DocumentIndexer) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            indexer: Arc::new(indexer),
            llm: None,
        }
    }

    pub fn with_llm(mut self, llm: Arc<LlmServiceProfiles>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Builds providers, the Qdrant store and the document repository from
    /// environment variables.
    ///
    /// Invalid credentials do not abort start-up: they are kept as the
    /// pipeline's readiness status and reported per request.
    pub async fn from_env() -> Result<Self, AppError> {
        let llm = Arc::new(LlmServiceProfiles::from_env()?);
        let credentials = llm.credential_status().clone();
        if let Some(reason) = &credentials.error {
            warn!(%reason, "provider credentials are invalid; queries will be rejected");
        }

        let store = Arc::new(RagStore::new(RagConfig::from_env()?)?);
        let documents: Arc<dyn DocumentRepository> =
            Arc::new(JsonFileDocuments::open(&store.config().document_store_path).await?);

        let cfg = PipelineConfig::from_env()?;
        let llm_ports = Arc::new(LlmPorts::new(llm.clone()));
        let index = Arc::new(QdrantIndex::new(store.clone()));

        let pipeline = RetrievalPipeline::new(
            PipelinePorts {
                embedding: llm_ports.clone(),
                index: index.clone(),
                rerank: llm_ports.clone(),
                generator: llm_ports.clone(),
            },
            cfg,
        )
        .with_readiness(credentials);
        let indexer = DocumentIndexer::new(llm_ports, index, documents);

        info!(
            collection = %store.config().collection,
            documents = %store.config().document_store_path,
            "application state ready"
        );
        Ok(Self::new(pipeline, indexer).with_llm(llm))
    }
}

//! Adaptive retrieval-augmented answering over pluggable ports.
//!
//! Public entry points:
//! - [`RetrievalPipeline::answer_query`]: primary search, query expansion when
//!   the primary round is weak, optional reranking, answer synthesis
//! - [`DocumentIndexer`]: embeds chunk texts and writes them to the index
//!
//! External services are reached only through the traits in [`ports`].
//! [`adapters`] implements them over `ai-llm-service` and `rag-store`.

pub mod adapters;
mod aggregator;
mod cfg;
mod embedding;
mod error;
mod expander;
mod ingest;
mod pipeline;
pub mod ports;
mod prompt;
mod reranker;
mod synthesizer;
mod types;

pub use aggregator::{ResultAggregator, dedupe_append, sort_by_raw_score};
pub use cfg::PipelineConfig;
pub use embedding::{EmbeddingAccess, combine};
pub use error::{PipelineError, PortError, PortKind};
pub use expander::{QueryExpander, parse_terms};
pub use ingest::{ChunkSink, DEFAULT_EMBED_BATCH, DocumentIndexer};
pub use pipeline::{
    NO_DOCUMENTS_MESSAGE, NO_RELEVANT_INFORMATION_MESSAGE, PipelinePorts, RetrievalPipeline,
    SearchOutcome,
};
pub use prompt::{DEGRADED_ANSWER_HEADER, EMPTY_ANSWER};
pub use reranker::Reranker;
pub use synthesizer::AnswerSynthesizer;
pub use types::{
    AnswerOptions, AnswerResponse, AnswerResult, Chunk, ExpansionStatus, Hit, QueryExpansion,
    RoundOrigin, SearchMethod, SourcePreview,
};

//! End-to-end scenarios for `RetrievalPipeline::answer_query` over in-memory ports.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ai_llm_service::CredentialStatus;
use ai_llm_service::error_handler::ConfigError;
use rag_pipeline::ports::{
    Embedding, EmbeddingKind, EmbeddingPort, GeneratorPort, PortFuture, RerankPort, RerankScore,
    VectorIndexPort,
};
use rag_pipeline::{
    AnswerOptions, AnswerResponse, Chunk, DEGRADED_ANSWER_HEADER, ExpansionStatus, Hit,
    NO_DOCUMENTS_MESSAGE, NO_RELEVANT_INFORMATION_MESSAGE, PipelineConfig, PipelineError,
    PipelinePorts, PortError, PortKind, RetrievalPipeline, RoundOrigin, SearchMethod,
};

/* ------------------------------------------------------------------------- */
/* Fakes                                                                     */
/* ------------------------------------------------------------------------- */

/// Embeds a text as `[n]` where `n` is the text's slot in `vocab`.
/// Unknown texts fail.
struct FakeEmbedder {
    vocab: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl EmbeddingPort for FakeEmbedder {
    fn embed<'a>(&'a self, texts: &'a [String], _kind: EmbeddingKind) -> PortFuture<'a, Vec<Embedding>> {
        self.calls.lock().unwrap().extend(texts.iter().cloned());
        let out: Result<Vec<Embedding>, PortError> = texts
            .iter()
            .map(|t| {
                self.vocab
                    .iter()
                    .position(|v| v == t)
                    .map(|i| vec![i as f32])
                    .ok_or_else(|| PortError::unavailable(PortKind::Embedding, format!("unknown text {t}")))
            })
            .collect();
        Box::pin(async move { out })
    }
}

/// Returns the hit list registered for the vocab slot encoded in the vector.
struct FakeIndex {
    exists: Result<bool, PortError>,
    results: HashMap<usize, Vec<Hit>>,
    searches: Mutex<Vec<(usize, usize)>>,
}

impl VectorIndexPort for FakeIndex {
    fn search<'a>(&'a self, vector: &'a [f32], limit: usize) -> PortFuture<'a, Vec<Hit>> {
        let slot = vector[0] as usize;
        self.searches.lock().unwrap().push((slot, limit));
        let mut hits = self.results.get(&slot).cloned().unwrap_or_default();
        hits.truncate(limit);
        Box::pin(async move { Ok(hits) })
    }

    fn exists(&self) -> PortFuture<'_, bool> {
        let r = self.exists.clone();
        Box::pin(async move { r })
    }
}

struct FakeGenerator {
    expansion: Result<String, PortError>,
    answer: Result<String, PortError>,
    prompts: Mutex<Vec<String>>,
}

impl GeneratorPort for FakeGenerator {
    fn complete<'a>(&'a self, prompt: &'a str, _max_tokens: u32, _temperature: f32) -> PortFuture<'a, String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let r = if prompt.starts_with("Given the search query") {
            self.expansion.clone()
        } else {
            self.answer.clone()
        };
        Box::pin(async move { r })
    }
}

/// Scores documents in reverse submission order, or fails.
struct FakeReranker {
    fail: bool,
    calls: Mutex<usize>,
}

impl RerankPort for FakeReranker {
    fn rerank<'a>(&'a self, _query: &'a str, documents: &'a [String], _top_n: usize) -> PortFuture<'a, Vec<RerankScore>> {
        *self.calls.lock().unwrap() += 1;
        let out = if self.fail {
            Err(PortError::unavailable(PortKind::Rerank, "503"))
        } else {
            Ok((0..documents.len())
                .map(|i| RerankScore {
                    index: i,
                    relevance_score: (i + 1) as f32 / 100.0,
                })
                .collect())
        };
        Box::pin(async move { out })
    }
}

struct Harness {
    embedder: Arc<FakeEmbedder>,
    index: Arc<FakeIndex>,
    generator: Arc<FakeGenerator>,
    reranker: Arc<FakeReranker>,
}

impl Harness {
    fn new(vocab: &[&str], results: Vec<(usize, Vec<Hit>)>) -> Self {
        Self {
            embedder: Arc::new(FakeEmbedder {
                vocab: vocab.iter().map(|s| s.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
            }),
            index: Arc::new(FakeIndex {
                exists: Ok(true),
                results: results.into_iter().collect(),
                searches: Mutex::new(Vec::new()),
            }),
            generator: Arc::new(FakeGenerator {
                expansion: Ok("java, backend, spring boot".into()),
                answer: Ok("Alice has five years of Java.".into()),
                prompts: Mutex::new(Vec::new()),
            }),
            reranker: Arc::new(FakeReranker {
                fail: false,
                calls: Mutex::new(0),
            }),
        }
    }

    fn pipeline(&self) -> RetrievalPipeline {
        RetrievalPipeline::new(
            PipelinePorts {
                embedding: self.embedder.clone(),
                index: self.index.clone(),
                rerank: self.reranker.clone(),
                generator: self.generator.clone(),
            },
            PipelineConfig::default(),
        )
    }

    fn generator_calls(&self) -> usize {
        self.generator.prompts.lock().unwrap().len()
    }
}

fn hit(id: &str, score: f32) -> Hit {
    Hit::new(
        Chunk {
            id: id.into(),
            text: format!("chunk {id} text"),
            source: "alice.pdf".into(),
            sequence: 0,
            source_chunk_count: 1,
        },
        score,
        RoundOrigin::Primary,
    )
}

fn answered(resp: AnswerResponse) -> rag_pipeline::AnswerResult {
    match resp {
        AnswerResponse::Answered(r) => r,
        other => panic!("expected an answer, got {other:?}"),
    }
}

const Q: &str = "java developer";

/* ------------------------------------------------------------------------- */
/* Scenarios                                                                 */
/* ------------------------------------------------------------------------- */

#[tokio::test]
async fn empty_corpus_short_circuits() {
    let mut h = Harness::new(&["skills in python"], vec![]);
    Arc::get_mut(&mut h.index).unwrap().exists = Ok(false);

    let resp = h
        .pipeline()
        .answer_query("skills in python", AnswerOptions::default())
        .await
        .unwrap();

    assert_eq!(
        resp,
        AnswerResponse::NoDocuments {
            message: NO_DOCUMENTS_MESSAGE.into()
        }
    );
    assert!(h.embedder.calls.lock().unwrap().is_empty());
    assert_eq!(h.generator_calls(), 0);
}

#[tokio::test]
async fn failed_existence_probe_counts_as_empty_corpus() {
    let mut h = Harness::new(&[Q], vec![]);
    Arc::get_mut(&mut h.index).unwrap().exists =
        Err(PortError::unavailable(PortKind::VectorIndex, "connection refused"));

    let resp = h.pipeline().answer_query(Q, AnswerOptions::default()).await.unwrap();
    assert!(matches!(resp, AnswerResponse::NoDocuments { .. }));
}

#[tokio::test]
async fn sufficient_primary_round_skips_expansion() {
    let scores = [0.9, 0.8, 0.75, 0.6, 0.5, 0.4, 0.35];
    let primary: Vec<Hit> = scores
        .iter()
        .enumerate()
        .map(|(i, s)| hit(&format!("p{i}"), *s))
        .collect();
    let h = Harness::new(&[Q], vec![(0, primary)]);

    let outcome = h.pipeline().adaptive_search(Q).await;

    let got: Vec<f32> = outcome.hits.iter().map(|h| h.raw_score).collect();
    assert_eq!(got, scores.to_vec());
    assert_eq!(outcome.expansion.status, ExpansionStatus::Skipped);
    assert_eq!(outcome.expansion.expanded_terms, vec![Q.to_string()]);
    assert_eq!(h.generator_calls(), 0);
    assert_eq!(*h.index.searches.lock().unwrap(), vec![(0, 20)]);
}

#[tokio::test]
async fn weak_primary_round_expands_and_merges() {
    let vocab = [Q, "java", "backend", "spring boot"];
    let h = Harness::new(
        &vocab,
        vec![
            (0, vec![hit("a", 0.25), hit("b", 0.2)]),
            (1, vec![hit("a", 0.95), hit("c", 0.6)]),
            (2, vec![hit("d", 0.7), hit("b", 0.9)]),
            (3, vec![hit("e", 0.1)]),
        ],
    );

    let outcome = h.pipeline().adaptive_search(Q).await;

    assert_eq!(outcome.expansion.status, ExpansionStatus::Generated);
    assert_eq!(
        outcome.expansion.expanded_terms,
        vec![Q, "java", "backend", "spring boot"]
    );
    assert_eq!(h.generator_calls(), 1);

    // Primary plus the first three expansion terms, the query among them.
    let searches = h.index.searches.lock().unwrap().clone();
    assert_eq!(searches, vec![(0, 20), (0, 10), (1, 10), (2, 10)]);

    // First-seen scores win: "a" keeps 0.25, "b" keeps 0.2.
    let ids: Vec<&str> = outcome.hits.iter().map(|h| h.chunk.id.as_str()).collect();
    assert_eq!(ids, vec!["d", "c", "a", "b"]);
    assert_eq!(outcome.hits[2].raw_score, 0.25);
    assert_eq!(outcome.hits[1].origin, RoundOrigin::Expanded(1));
}

#[tokio::test]
async fn unembeddable_query_still_expands() {
    // The query itself is not in the vocab, so its embedding fails.
    let h = Harness::new(
        &["java", "backend"],
        vec![(0, vec![hit("c", 0.6)]), (1, vec![hit("d", 0.4)])],
    );

    let outcome = h.pipeline().adaptive_search(Q).await;

    assert_eq!(outcome.expansion.status, ExpansionStatus::Generated);
    assert_eq!(h.generator_calls(), 1);
    assert!(h.generator.prompts.lock().unwrap()[0].starts_with("Given the search query"));

    // No primary search ran; only the embeddable expansion terms did.
    let mut searches = h.index.searches.lock().unwrap().clone();
    searches.sort();
    assert_eq!(searches, vec![(0, 10), (1, 10)]);

    let got: Vec<(&str, RoundOrigin)> = outcome
        .hits
        .iter()
        .map(|h| (h.chunk.id.as_str(), h.origin))
        .collect();
    assert_eq!(
        got,
        vec![("c", RoundOrigin::Expanded(1)), ("d", RoundOrigin::Expanded(2))]
    );

    let result = answered(h.pipeline().answer_query(Q, AnswerOptions::default()).await.unwrap());
    assert_eq!(result.answer, "Alice has five years of Java.");
    assert_eq!(result.sources.len(), 2);
}

#[tokio::test]
async fn merged_results_are_truncated_to_top_k() {
    let vocab = [Q, "java", "backend"];
    let many = |prefix: &str| -> Vec<Hit> {
        (0..10).map(|i| hit(&format!("{prefix}{i}"), 0.2 + i as f32 / 100.0)).collect()
    };
    let mut h = Harness::new(&vocab, vec![(0, many("p")), (1, many("j")), (2, many("b"))]);
    Arc::get_mut(&mut h.generator).unwrap().expansion = Ok("java, backend".into());

    let outcome = h.pipeline().adaptive_search(Q).await;
    assert_eq!(outcome.hits.len(), 10);
    let mut ids: Vec<&str> = outcome.hits.iter().map(|h| h.chunk.id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 10);
    assert!(outcome.hits.windows(2).all(|w| w[0].raw_score >= w[1].raw_score));
}

#[tokio::test]
async fn enhanced_answer_reranks_and_reports_sources() {
    let primary: Vec<Hit> = (0..6).map(|i| hit(&format!("p{i}"), 0.9 - i as f32 / 10.0)).collect();
    let h = Harness::new(&[Q], vec![(0, primary)]);

    let result = answered(h.pipeline().answer_query(Q, AnswerOptions::default()).await.unwrap());

    assert_eq!(result.answer, "Alice has five years of Java.");
    assert_eq!(result.search_method, SearchMethod::Enhanced);
    assert!(result.reranking_applied);
    assert_eq!(result.sources.len(), 6);
    // The fake reranker favours later submissions.
    assert_eq!(result.sources[0].preview, "chunk p5 text...");
    assert!((result.sources[0].score - 0.06).abs() < 1e-6);
    assert!((result.sources[0].original_score - 0.4).abs() < 1e-6);
    assert_eq!(*h.reranker.calls.lock().unwrap(), 1);

    let prompts = h.generator.prompts.lock().unwrap();
    let answer_prompt = prompts.last().unwrap();
    assert_eq!(answer_prompt.matches("\n\n---\n\n").count(), 4);
    assert!(!answer_prompt.contains("chunk p0 text"));
}

#[tokio::test]
async fn reranker_failure_keeps_order() {
    let primary: Vec<Hit> = (0..5).map(|i| hit(&format!("p{i}"), 0.9 - i as f32 / 10.0)).collect();
    let mut h = Harness::new(&[Q], vec![(0, primary)]);
    Arc::get_mut(&mut h.reranker).unwrap().fail = true;

    let result = answered(h.pipeline().answer_query(Q, AnswerOptions::default()).await.unwrap());
    let files: Vec<&str> = result.sources.iter().map(|s| s.preview.as_str()).collect();
    assert_eq!(files[0], "chunk p0 text...");
    assert_eq!(result.sources.len(), 5);
    assert!(result.sources.iter().all(|s| s.score == 0.5));
}

#[tokio::test]
async fn generator_failure_still_answers_with_excerpts() {
    let primary: Vec<Hit> = (0..5).map(|i| hit(&format!("p{i}"), 0.9)).collect();
    let mut h = Harness::new(&[Q], vec![(0, primary)]);
    Arc::get_mut(&mut h.generator).unwrap().answer =
        Err(PortError::unavailable(PortKind::Generator, "timeout"));

    let opts = AnswerOptions {
        use_expansion: true,
        use_reranking: false,
    };
    let result = answered(h.pipeline().answer_query(Q, opts).await.unwrap());
    assert!(result.answer.starts_with(DEGRADED_ANSWER_HEADER));
    assert!(!result.reranking_applied);
    assert_eq!(*h.reranker.calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn nothing_found_after_expansion() {
    let mut h = Harness::new(&[Q], vec![]);
    Arc::get_mut(&mut h.generator).unwrap().expansion =
        Err(PortError::unavailable(PortKind::Generator, "down"));

    let resp = h.pipeline().answer_query(Q, AnswerOptions::default()).await.unwrap();
    match resp {
        AnswerResponse::NoRelevantInformation {
            message,
            search_method,
            expansion,
        } => {
            assert_eq!(message, NO_RELEVANT_INFORMATION_MESSAGE);
            assert_eq!(search_method, SearchMethod::Enhanced);
            assert_eq!(expansion.unwrap().status, ExpansionStatus::Degraded);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(*h.reranker.calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn basic_mode_searches_once_without_expansion() {
    let primary: Vec<Hit> = (0..8).map(|i| hit(&format!("p{i}"), 0.1)).collect();
    let h = Harness::new(&[Q], vec![(0, primary)]);

    let opts = AnswerOptions {
        use_expansion: false,
        use_reranking: true,
    };
    let result = answered(h.pipeline().answer_query(Q, opts).await.unwrap());

    assert_eq!(result.search_method, SearchMethod::Basic);
    assert!(!result.reranking_applied);
    assert!(result.expansion.is_none());
    assert_eq!(result.sources.len(), 5);
    assert_eq!(*h.index.searches.lock().unwrap(), vec![(0, 5)]);
    assert_eq!(*h.reranker.calls.lock().unwrap(), 0);
    assert_eq!(h.generator_calls(), 1);
}

#[tokio::test]
async fn basic_mode_embedding_failure_degrades() {
    let h = Harness::new(&[], vec![]);
    let opts = AnswerOptions {
        use_expansion: false,
        use_reranking: false,
    };
    let resp = h.pipeline().answer_query(Q, opts).await.unwrap();
    assert!(matches!(
        resp,
        AnswerResponse::NoRelevantInformation {
            search_method: SearchMethod::Basic,
            expansion: None,
            ..
        }
    ));
}

#[tokio::test]
async fn blank_query_is_an_input_error() {
    let h = Harness::new(&[], vec![]);
    let err = h.pipeline().answer_query("   ", AnswerOptions::default()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Input(_)));
    assert!(h.index.searches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_credentials_fail_before_any_call() {
    let h = Harness::new(&[Q], vec![]);
    let status = CredentialStatus::invalid(&ConfigError::MissingVar("COHERE_API_KEY"));
    let pipeline = h.pipeline().with_readiness(status);

    let err = pipeline.answer_query(Q, AnswerOptions::default()).await.unwrap_err();
    match err {
        PipelineError::Configuration(msg) => assert!(msg.contains("COHERE_API_KEY")),
        other => panic!("unexpected {other:?}"),
    }
    assert!(h.embedder.calls.lock().unwrap().is_empty());
}

//! Embedding access that never fails, plus vector combination.

use std::sync::Arc;

use tracing::warn;

use crate::ports::{Embedding, EmbeddingKind, EmbeddingPort};

/// Wraps an [`EmbeddingPort`] so callers get an empty result instead of an error.
#[derive(Clone)]
pub struct EmbeddingAccess {
    port: Arc<dyn EmbeddingPort>,
}

impl EmbeddingAccess {
    pub fn new(port: Arc<dyn EmbeddingPort>) -> Self {
        Self { port }
    }

    /// One embedding, or an empty vector on any failure.
    pub async fn embed_one(&self, text: &str, kind: EmbeddingKind) -> Embedding {
        let texts = [text.to_string()];
        self.embed_many(&texts, kind)
            .await
            .into_iter()
            .next()
            .unwrap_or_default()
    }

    /// Embeddings aligned with `texts`, or an empty list on total failure.
    ///
    /// A response with the wrong number of vectors counts as a failure.
    pub async fn embed_many(&self, texts: &[String], kind: EmbeddingKind) -> Vec<Embedding> {
        if texts.is_empty() {
            return Vec::new();
        }
        match self.port.embed(texts, kind).await {
            Ok(vectors) if vectors.len() == texts.len() => vectors,
            Ok(vectors) => {
                warn!(
                    target: "rag_pipeline::embedding",
                    expected = texts.len(),
                    got = vectors.len(),
                    "embedding count mismatch; treating as failure"
                );
                Vec::new()
            }
            Err(e) => {
                warn!(target: "rag_pipeline::embedding", error = %e, ?kind, count = texts.len(), "embedding failed");
                Vec::new()
            }
        }
    }
}

/// Weighted element-wise sum, then L2-normalised.
///
/// - `weights` default to `1/n`; a weight list of the wrong length is ignored.
/// - Vectors whose length differs from the first are skipped.
/// - A zero-norm result is returned unnormalised.
/// - Empty input yields an empty vector.
pub fn combine(embeddings: &[Embedding], weights: Option<&[f32]>) -> Embedding {
    let Some(first) = embeddings.first() else {
        return Vec::new();
    };
    let dim = first.len();
    let n = embeddings.len();
    let uniform = 1.0 / n as f32;
    let weights = weights.filter(|w| w.len() == n);

    let mut out = vec![0.0f32; dim];
    for (i, v) in embeddings.iter().enumerate() {
        if v.len() != dim {
            continue;
        }
        let w = weights.map_or(uniform, |ws| ws[i]);
        for (acc, x) in out.iter_mut().zip(v) {
            *acc += w * x;
        }
    }

    let norm = out.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        out.iter_mut().for_each(|x| *x /= norm);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PortError, PortKind};
    use crate::ports::PortFuture;

    struct Fixed(Result<Vec<Embedding>, PortError>);

    impl EmbeddingPort for Fixed {
        fn embed<'a>(&'a self, _t: &'a [String], _k: EmbeddingKind) -> PortFuture<'a, Vec<Embedding>> {
            let r = self.0.clone();
            Box::pin(async move { r })
        }
    }

    fn close(a: &[f32], b: &[f32]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-6)
    }

    #[test]
    fn combine_of_equal_vectors_is_normalised_vector() {
        let v = vec![3.0, 4.0];
        let out = combine(&[v.clone(), v.clone(), v], None);
        assert!(close(&out, &[0.6, 0.8]));
    }

    #[test]
    fn combine_edge_cases() {
        assert!(combine(&[], None).is_empty());
        assert!(close(&combine(&[vec![0.0, 0.0]], None), &[0.0, 0.0]));
        let out = combine(&[vec![1.0, 0.0], vec![0.0, 1.0]], Some(&[3.0, 1.0]));
        let n = (10.0f32).sqrt();
        assert!(close(&out, &[3.0 / n, 1.0 / n]));
    }

    #[test]
    fn combine_skips_mismatched_dimensions() {
        let out = combine(&[vec![1.0, 0.0], vec![1.0, 1.0, 1.0]], None);
        assert!(close(&out, &[1.0, 0.0]));
    }

    #[tokio::test]
    async fn failure_yields_empty() {
        let access = EmbeddingAccess::new(Arc::new(Fixed(Err(PortError::unavailable(
            PortKind::Embedding,
            "down",
        )))));
        assert!(access.embed_one("q", EmbeddingKind::Query).await.is_empty());
        assert!(access
            .embed_many(&["a".into(), "b".into()], EmbeddingKind::Query)
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn count_mismatch_is_failure() {
        let access = EmbeddingAccess::new(Arc::new(Fixed(Ok(vec![vec![1.0]]))));
        let out = access
            .embed_many(&["a".into(), "b".into()], EmbeddingKind::Document)
            .await;
        assert!(out.is_empty());
        assert_eq!(access.embed_one("a", EmbeddingKind::Query).await, vec![1.0]);
    }
}

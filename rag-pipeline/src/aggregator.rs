//! Merging and ranking of hits across retrieval rounds.

use std::collections::HashSet;

use crate::types::Hit;

/// Appends each hit whose chunk id is unseen and records the id.
///
/// Later duplicates are discarded, so the first-seen score wins and earlier
/// rounds win ties. Returns how many hits were added.
pub fn dedupe_append(seen: &mut HashSet<String>, acc: &mut Vec<Hit>, new_hits: Vec<Hit>) -> usize {
    let before = acc.len();
    for hit in new_hits {
        if seen.insert(hit.chunk.id.clone()) {
            acc.push(hit);
        }
    }
    acc.len() - before
}

/// Stable sort by `raw_score`, highest first.
pub fn sort_by_raw_score(hits: &mut [Hit]) {
    hits.sort_by(|a, b| b.raw_score.total_cmp(&a.raw_score));
}

/// Request-scoped accumulator over retrieval rounds.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    seen: HashSet<String>,
    hits: Vec<Hit>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, new_hits: Vec<Hit>) -> usize {
        dedupe_append(&mut self.seen, &mut self.hits, new_hits)
    }

    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Sorted by raw score and cut to `k`.
    pub fn into_top(self, k: usize) -> Vec<Hit> {
        let mut hits = self.hits;
        sort_by_raw_score(&mut hits);
        hits.truncate(k);
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, RoundOrigin};

    fn hit(id: &str, score: f32, origin: RoundOrigin) -> Hit {
        Hit::new(
            Chunk {
                id: id.into(),
                text: format!("text {id}"),
                source: "cv.pdf".into(),
                sequence: 0,
                source_chunk_count: 1,
            },
            score,
            origin,
        )
    }

    #[test]
    fn first_seen_occurrence_wins() {
        let mut agg = ResultAggregator::new();
        assert_eq!(agg.append(vec![hit("a", 0.2, RoundOrigin::Primary)]), 1);
        let added = agg.append(vec![
            hit("a", 0.9, RoundOrigin::Expanded(0)),
            hit("b", 0.4, RoundOrigin::Expanded(0)),
        ]);
        assert_eq!(added, 1);
        let a = agg.hits().iter().find(|h| h.chunk.id == "a").unwrap();
        assert_eq!(a.raw_score, 0.2);
        assert_eq!(a.origin, RoundOrigin::Primary);
    }

    #[test]
    fn duplicates_within_one_round_are_dropped() {
        let mut agg = ResultAggregator::new();
        agg.append(vec![
            hit("a", 0.5, RoundOrigin::Primary),
            hit("a", 0.4, RoundOrigin::Primary),
        ]);
        assert_eq!(agg.len(), 1);
    }

    #[test]
    fn sort_is_descending_and_stable() {
        let mut agg = ResultAggregator::new();
        agg.append(vec![
            hit("x", 0.5, RoundOrigin::Primary),
            hit("y", 0.9, RoundOrigin::Primary),
            hit("z", 0.5, RoundOrigin::Expanded(1)),
        ]);
        let top = agg.into_top(10);
        let ids: Vec<_> = top.iter().map(|h| h.chunk.id.as_str()).collect();
        assert_eq!(ids, vec!["y", "x", "z"]);
    }

    #[test]
    fn into_top_truncates() {
        let mut agg = ResultAggregator::new();
        agg.append((0..15).map(|i| hit(&i.to_string(), i as f32 / 100.0, RoundOrigin::Primary)).collect());
        let top = agg.into_top(10);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].chunk.id, "14");
    }
}

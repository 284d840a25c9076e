//! Filter conversion to Qdrant `Filter`.
//!
//! Supports exact equality on scalar fields (`String`, integer `Number`, `Bool`)
//! and inclusive lower bounds on integer fields.

use crate::record::RagFilter;
use qdrant_client::qdrant::{
    Condition, FieldCondition, Filter, Match, Range, condition::ConditionOneOf,
    r#match::MatchValue,
};
use tracing::{debug, warn};

/// Converts [`RagFilter`] to a Qdrant [`Filter`] where every condition must hold.
///
/// - `String` → `Keyword`
/// - `Number` → `Integer` (non-integers are skipped)
/// - `Bool`   → `Boolean`
pub fn to_qdrant_filter(f: &RagFilter) -> Filter {
    debug!(
        "filters::to_qdrant_filter equals={} at_least={}",
        f.equals.len(),
        f.at_least.len()
    );

    let mut must: Vec<Condition> = Vec::new();

    for (field, val) in &f.equals {
        let match_value = match val {
            serde_json::Value::String(s) => MatchValue::Keyword(s.clone()),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => MatchValue::Integer(i),
                None => {
                    warn!(%field, "skipping non-integer numeric filter");
                    continue;
                }
            },
            serde_json::Value::Bool(b) => MatchValue::Boolean(*b),
            _ => {
                warn!(%field, "skipping unsupported filter value");
                continue;
            }
        };

        must.push(Condition {
            condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
                key: field.clone(),
                r#match: Some(Match {
                    match_value: Some(match_value),
                }),
                ..Default::default()
            })),
        });
    }

    for (field, min) in &f.at_least {
        must.push(Condition {
            condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
                key: field.clone(),
                range: Some(Range {
                    gte: Some(*min as f64),
                    ..Default::default()
                }),
                ..Default::default()
            })),
        });
    }

    Filter {
        must,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_filter_becomes_single_must_keyword() {
        let f = to_qdrant_filter(&RagFilter::source("cv.pdf"));
        assert_eq!(f.must.len(), 1);
        assert!(f.should.is_empty());
        let Some(ConditionOneOf::Field(fc)) = &f.must[0].condition_one_of else {
            panic!("expected field condition");
        };
        assert_eq!(fc.key, "source");
        assert_eq!(
            fc.r#match.as_ref().and_then(|m| m.match_value.clone()),
            Some(MatchValue::Keyword("cv.pdf".into()))
        );
    }

    #[test]
    fn unsupported_values_are_skipped() {
        let f = to_qdrant_filter(&RagFilter {
            equals: vec![
                ("score".into(), serde_json::json!(0.5)),
                ("tags".into(), serde_json::json!(["a"])),
                ("chunk_index".into(), serde_json::json!(3)),
            ],
            ..Default::default()
        });
        assert_eq!(f.must.len(), 1);
    }

    #[test]
    fn source_tail_adds_inclusive_index_range() {
        let f = to_qdrant_filter(&RagFilter::source_tail("cv.pdf", 4));
        assert_eq!(f.must.len(), 2);
        let Some(ConditionOneOf::Field(fc)) = &f.must[1].condition_one_of else {
            panic!("expected field condition");
        };
        assert_eq!(fc.key, "chunk_index");
        let range = fc.range.as_ref().expect("range");
        assert_eq!(range.gte, Some(4.0));
        assert_eq!(range.lt, None);
    }
}

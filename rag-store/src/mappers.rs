//! Conversions between Qdrant points and the crate's records.
//!
//! Payload layout: `text`, `source`, `chunk_index`, `total_chunks`, `type`.
//! A hit whose payload cannot produce a valid chunk is rejected here so the
//! rest of the system only ever sees well-formed [`RagHit`]s.

use std::collections::HashMap;

use qdrant_client::qdrant::{
    PointId, PointStruct, ScoredPoint, Value as QValue, Vector, Vectors, point_id::PointIdOptions,
    value, vectors,
};
use serde_json::Value;

use crate::record::{ChunkRecord, RagHit};

/// Builds a Qdrant point from a chunk record.
pub fn chunk_to_point(r: ChunkRecord) -> PointStruct {
    let mut payload: HashMap<String, QValue> = HashMap::new();
    payload.insert("text".into(), qstring(&r.text));
    payload.insert("source".into(), qstring(&r.source));
    payload.insert("chunk_index".into(), qint(r.chunk_index));
    payload.insert("total_chunks".into(), qint(r.total_chunks));
    payload.insert("type".into(), qstring("pdf"));

    let pid: PointId = r.id.into();

    let vectors = Vectors {
        vectors_options: Some(vectors::VectorsOptions::Vector(Vector {
            data: r.vector,
            indices: None,
            vectors_count: None,
            vector: None,
        })),
    };

    PointStruct {
        id: Some(pid),
        payload,
        vectors: Some(vectors),
        ..Default::default()
    }
}

/// Validates a scored point and turns it into a [`RagHit`].
///
/// Errors describe the first missing or malformed field.
pub fn scored_to_hit(p: ScoredPoint) -> Result<RagHit, String> {
    let id = match p.id.and_then(|id| id.point_id_options) {
        Some(PointIdOptions::Uuid(u)) => u,
        Some(PointIdOptions::Num(n)) => n.to_string(),
        None => return Err("point without id".into()),
    };
    let payload = qpayload_to_json(p.payload);
    payload_to_hit(id, p.score, &payload)
}

/// Validates a JSON payload (already converted from Qdrant) into a [`RagHit`].
pub fn payload_to_hit(id: String, score: f32, payload: &Value) -> Result<RagHit, String> {
    if !score.is_finite() {
        return Err(format!("point {id}: non-finite score"));
    }
    let text = payload
        .get("text")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("point {id}: missing or empty `text`"))?;
    let source = payload
        .get("source")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| format!("point {id}: missing or empty `source`"))?;
    let chunk_index = payload
        .get("chunk_index")
        .and_then(Value::as_u64)
        .ok_or_else(|| format!("point {id}: missing or invalid `chunk_index`"))?
        as usize;
    let total_chunks = payload
        .get("total_chunks")
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .unwrap_or(chunk_index + 1);

    Ok(RagHit {
        id,
        score,
        text: text.to_string(),
        source: source.to_string(),
        chunk_index,
        total_chunks,
    })
}

/// Converts a Qdrant payload (`HashMap<String, qdrant::Value>`) into JSON.
///
/// Nested lists/structs are mapped to `Null`; the chunk payload never uses them.
pub fn qpayload_to_json(mut p: HashMap<String, QValue>) -> Value {
    use value::Kind as K;
    let mut m = serde_json::Map::new();
    for (k, v) in p.drain() {
        let j = match v.kind {
            Some(K::StringValue(s)) => Value::String(s),
            Some(K::IntegerValue(i)) => Value::Number(i.into()),
            Some(K::DoubleValue(f)) => serde_json::json!(f),
            Some(K::BoolValue(b)) => Value::Bool(b),
            _ => Value::Null,
        };
        m.insert(k, j);
    }
    Value::Object(m)
}

fn qstring(s: &str) -> QValue {
    QValue {
        kind: Some(value::Kind::StringValue(s.to_string())),
    }
}

fn qint(n: usize) -> QValue {
    QValue {
        kind: Some(value::Kind::IntegerValue(n as i64)),
    }
}

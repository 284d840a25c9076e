use uuid::Uuid;

/// Deterministic UUIDv5 point id for chunk `sequence` of `source`.
///
/// Re-indexing the same document overwrites its points instead of duplicating them.
pub fn chunk_point_id(source: &str, sequence: usize) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("{source}#{sequence}").as_bytes())
}

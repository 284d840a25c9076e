use serde::{Deserialize, Serialize};

/// Request payload for /index_document. `chunks` are pre-split texts.
#[derive(Debug, Deserialize)]
pub struct IndexDocumentRequest {
    pub filename: String,
    pub chunks: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct IndexDocumentResponse {
    pub filename: String,
    pub chunks: usize,
}

/// Request payload for /delete_file.
#[derive(Debug, Deserialize)]
pub struct DeleteFileRequest {
    pub filename: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFileResponse {
    pub filename: String,
    pub removed_chunks: usize,
}

#[derive(Debug, Serialize)]
pub struct ListFilesResponse {
    pub files: Vec<String>,
}

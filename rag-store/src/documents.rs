//! Document bookkeeping: which sources were indexed and with which chunks.
//!
//! [`DocumentRepository`] is injected where needed; the retrieval path never
//! touches it. Two implementations ship with the crate:
//! - [`InMemoryDocuments`] for tests and ephemeral deployments
//! - [`JsonFileDocuments`], which rewrites one JSON file after every mutation

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::errors::RagError;

/// One chunk as remembered by the repository.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Point id in the vector index.
    pub id: String,
    pub sequence: usize,
    pub text: String,
}

/// A source document and its chunks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub source: String,
    pub chunks: Vec<StoredChunk>,
    pub indexed_at: DateTime<Utc>,
}

/// Storage for [`StoredDocument`]s keyed by source name.
pub trait DocumentRepository: Send + Sync {
    /// Inserts or replaces the document for `doc.source`.
    fn put(&self, doc: StoredDocument) -> BoxFuture<'_, Result<(), RagError>>;

    fn get<'a>(&'a self, source: &'a str)
    -> BoxFuture<'a, Result<Option<StoredDocument>, RagError>>;

    /// Removes the document; returns it if it existed.
    fn delete<'a>(
        &'a self,
        source: &'a str,
    ) -> BoxFuture<'a, Result<Option<StoredDocument>, RagError>>;

    /// Source names in ascending order.
    fn list(&self) -> BoxFuture<'_, Result<Vec<String>, RagError>>;

    fn exists<'a>(&'a self, source: &'a str) -> BoxFuture<'a, Result<bool, RagError>> {
        async move { Ok(self.get(source).await?.is_some()) }.boxed()
    }

    fn has_documents(&self) -> BoxFuture<'_, Result<bool, RagError>> {
        async move { Ok(!self.list().await?.is_empty()) }.boxed()
    }
}

/* ------------------------------------------------------------------------- */
/* In-memory                                                                 */
/* ------------------------------------------------------------------------- */

#[derive(Default)]
pub struct InMemoryDocuments {
    docs: RwLock<BTreeMap<String, StoredDocument>>,
}

impl InMemoryDocuments {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentRepository for InMemoryDocuments {
    fn put(&self, doc: StoredDocument) -> BoxFuture<'_, Result<(), RagError>> {
        async move {
            self.docs.write().await.insert(doc.source.clone(), doc);
            Ok(())
        }
        .boxed()
    }

    fn get<'a>(
        &'a self,
        source: &'a str,
    ) -> BoxFuture<'a, Result<Option<StoredDocument>, RagError>> {
        async move { Ok(self.docs.read().await.get(source).cloned()) }.boxed()
    }

    fn delete<'a>(
        &'a self,
        source: &'a str,
    ) -> BoxFuture<'a, Result<Option<StoredDocument>, RagError>> {
        async move { Ok(self.docs.write().await.remove(source)) }.boxed()
    }

    fn list(&self) -> BoxFuture<'_, Result<Vec<String>, RagError>> {
        async move { Ok(self.docs.read().await.keys().cloned().collect()) }.boxed()
    }
}

/* ------------------------------------------------------------------------- */
/* JSON file                                                                 */
/* ------------------------------------------------------------------------- */

/// File-backed repository. The whole map is kept in memory and written out
/// (temp file + rename) after each mutation, under the write lock. The
/// in-memory map only changes once the write has succeeded.
pub struct JsonFileDocuments {
    path: PathBuf,
    docs: RwLock<BTreeMap<String, StoredDocument>>,
}

impl JsonFileDocuments {
    /// Opens the store at `path`. A missing file is an empty store.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, RagError> {
        let path = path.as_ref().to_path_buf();
        let docs = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice::<BTreeMap<String, StoredDocument>>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), documents = docs.len(), "document store loaded");
        Ok(Self {
            path,
            docs: RwLock::new(docs),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, docs: &BTreeMap<String, StoredDocument>) -> Result<(), RagError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let bytes = serde_json::to_vec_pretty(docs)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), documents = docs.len(), "document store persisted");
        Ok(())
    }
}

impl DocumentRepository for JsonFileDocuments {
    fn put(&self, doc: StoredDocument) -> BoxFuture<'_, Result<(), RagError>> {
        async move {
            let mut docs = self.docs.write().await;
            let mut next = docs.clone();
            next.insert(doc.source.clone(), doc);
            self.persist(&next).await?;
            *docs = next;
            Ok(())
        }
        .boxed()
    }

    fn get<'a>(
        &'a self,
        source: &'a str,
    ) -> BoxFuture<'a, Result<Option<StoredDocument>, RagError>> {
        async move { Ok(self.docs.read().await.get(source).cloned()) }.boxed()
    }

    fn delete<'a>(
        &'a self,
        source: &'a str,
    ) -> BoxFuture<'a, Result<Option<StoredDocument>, RagError>> {
        async move {
            let mut docs = self.docs.write().await;
            if !docs.contains_key(source) {
                return Ok(None);
            }
            let mut next = docs.clone();
            let removed = next.remove(source);
            self.persist(&next).await?;
            *docs = next;
            Ok(removed)
        }
        .boxed()
    }

    fn list(&self) -> BoxFuture<'_, Result<Vec<String>, RagError>> {
        async move { Ok(self.docs.read().await.keys().cloned().collect()) }.boxed()
    }
}

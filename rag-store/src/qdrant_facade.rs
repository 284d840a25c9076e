//! Thin adapter around `qdrant-client` to isolate API usage.
//!
//! This facade concentrates all Qdrant interactions behind a minimal API,
//! hiding away the verbose builder pattern and keeping the rest of the
//! application decoupled from `qdrant-client`.

use crate::config::{DistanceKind, RagConfig, VectorSpace};
use crate::errors::RagError;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter,
    PointStruct, ScoredPoint, SearchParamsBuilder, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder,
};
use tracing::{debug, info};

/// A facade over the Qdrant client to keep the rest of the code clean and stable.
pub struct QdrantFacade {
    pub(crate) client: Qdrant,
    pub(crate) collection: String,
    distance: DistanceKind,
}

impl QdrantFacade {
    /// Creates a new facade from the given configuration.
    pub fn new(cfg: &RagConfig) -> Result<Self, RagError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.qdrant_url);
        if let Some(key) = &cfg.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            collection: cfg.collection.clone(),
            distance: cfg.distance,
        })
    }

    /// Returns whether the collection exists.
    pub async fn collection_exists(&self) -> Result<bool, RagError> {
        let exists = self.client.collection_exists(self.collection.clone()).await?;
        debug!(collection = %self.collection, exists, "collection probe");
        Ok(exists)
    }

    /// Ensures that the collection exists in Qdrant.
    ///
    /// - If the collection already exists → no-op.
    /// - If missing → creates it with the given vector space configuration.
    pub async fn ensure_collection(&self, space: &VectorSpace) -> Result<(), RagError> {
        if self.collection_exists().await? {
            return Ok(());
        }

        let distance = match self.distance {
            DistanceKind::Cosine => Distance::Cosine,
            DistanceKind::Dot => Distance::Dot,
            DistanceKind::Euclid => Distance::Euclid,
        };

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(space.size as u64, distance)),
            )
            .await?;

        info!(
            collection = %self.collection,
            size = space.size,
            distance = ?self.distance,
            "collection created"
        );
        Ok(())
    }

    /// Upserts (inserts or updates) a batch of points and waits for it to apply.
    pub async fn upsert_points(&self, points: Vec<PointStruct>) -> Result<usize, RagError> {
        if points.is_empty() {
            debug!("No points provided for upsert");
            return Ok(0);
        }
        let n = points.len();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await?;

        debug!(collection = %self.collection, points = n, "upsert applied");
        Ok(n)
    }

    /// Deletes every point matching `filter`.
    pub async fn delete_by_filter(&self, filter: Filter) -> Result<(), RagError> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(filter)
                    .wait(true),
            )
            .await?;
        Ok(())
    }

    /// Performs a similarity search; results come back in descending score order.
    pub async fn search(
        &self,
        vector: Vec<f32>,
        top_k: u64,
        filter: Option<Filter>,
        with_payload: bool,
        exact: bool,
    ) -> Result<Vec<ScoredPoint>, RagError> {
        debug!(
            collection = %self.collection,
            top_k,
            with_payload,
            exact,
            "search"
        );

        let mut builder =
            SearchPointsBuilder::new(&self.collection, vector, top_k).with_payload(with_payload);

        if let Some(f) = filter {
            builder = builder.filter(f);
        }
        if exact {
            builder = builder.params(SearchParamsBuilder::default().exact(true));
        }

        let res = self.client.search_points(builder).await?;
        debug!(hits = res.result.len(), "search completed");
        Ok(res.result)
    }
}

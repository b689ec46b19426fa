use async_trait::async_trait;
use thiserror::Error;

/// A categorical value recalled from the vector index, with the column it
/// was catalogued from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryHit {
    pub value: String,
    pub source_column: String,
}

/// The primary retrieval tier could not be consulted at all: index
/// unreachable, collection missing, or the search itself failed.
///
/// Deliberately distinct from `Ok(vec![])` — a reachable index that finds
/// nothing is a valid terminal result and must NOT trigger the fallback
/// tier.
#[derive(Clone, Debug, Error)]
#[error("category index unavailable: {0}")]
pub struct IndexUnavailable(pub String);

/// Read-only view of the category vector index. Writes happen only in the
/// batch indexing job, never from the pipeline.
#[async_trait]
pub trait CategoryIndex: Send + Sync {
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CategoryHit>, IndexUnavailable>;
}

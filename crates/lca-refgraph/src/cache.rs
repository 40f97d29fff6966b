//! Per-resolution record cache using moka
//!
//! One cache lives for exactly one root resolution. It is never shared
//! between resolutions and never persisted.

use crate::error::StoreError;
use lca_dataset::{DatasetRecord, RefPointer};
use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;

/// Where a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Already cached by an earlier fetch in this resolution
    Hit,
    /// Fetched from the store and cached now
    Miss,
}

/// Traversal-scoped map from identity to fetched record
#[derive(Debug, Clone)]
pub struct RefCache {
    inner: Cache<RefPointer, Arc<DatasetRecord>>,
}

impl RefCache {
    /// Create cache with max capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    /// Get record from cache
    pub async fn get(&self, pointer: &RefPointer) -> Option<Arc<DatasetRecord>> {
        self.inner.get(pointer).await
    }

    /// Insert record into cache
    pub async fn insert(&self, pointer: RefPointer, record: Arc<DatasetRecord>) {
        self.inner.insert(pointer, record).await;
    }

    /// Get a cached record or fetch and cache it
    ///
    /// Failed fetches are not cached.
    ///
    /// # Errors
    /// Propagates the fetch error
    pub async fn try_get_or_fetch<F, Fut>(
        &self,
        pointer: &RefPointer,
        fetch: F,
    ) -> Result<(Arc<DatasetRecord>, CacheOutcome), StoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<DatasetRecord, StoreError>>,
    {
        if let Some(cached) = self.get(pointer).await {
            return Ok((cached, CacheOutcome::Hit));
        }

        let record = Arc::new(fetch().await?);
        self.insert(pointer.clone(), Arc::clone(&record)).await;

        Ok((record, CacheOutcome::Miss))
    }

    /// Whether the identity has been cached
    pub async fn contains(&self, pointer: &RefPointer) -> bool {
        self.inner.get(pointer).await.is_some()
    }
}

impl Default for RefCache {
    /// Create cache with default capacity (10,000 entries)
    fn default() -> Self {
        Self::new(10_000)
    }
}

//! Request-scoped read-through cache over a content store.
//!
//! A `CachedStore` is created by the caller for one request and dropped with
//! it. Identical calls (same operation and arguments) within that scope hit
//! the store once; concurrent identical calls are coalesced by Moka. Errors
//! are not cached.

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;

use super::{ContentStore, Document, Query, StoreError};

/// Upper bound on distinct calls memoized within one request.
const MAX_ENTRIES: u64 = 256;

/// Cache key: the operation and its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Find { collection: String, query: Query },
    Global(String),
}

#[derive(Clone)]
enum CacheValue {
    Docs(Arc<Vec<Document>>),
    Global(Option<Arc<Document>>),
}

/// Memoizing decorator; implements `ContentStore` itself.
#[derive(Clone)]
pub struct CachedStore {
    inner: Arc<dyn ContentStore>,
    cache: Cache<CacheKey, CacheValue>,
}

impl CachedStore {
    /// Wrap `inner` with a fresh, empty cache.
    pub fn new(inner: Arc<dyn ContentStore>) -> Self {
        Self {
            inner,
            cache: Cache::builder().max_capacity(MAX_ENTRIES).build(),
        }
    }
}

impl std::fmt::Debug for CachedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedStore")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

#[async_trait]
impl ContentStore for CachedStore {
    async fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let key = CacheKey::Find {
            collection: collection.to_string(),
            query: query.clone(),
        };

        let value = self
            .cache
            .try_get_with(key, async {
                debug!(collection = %collection, "request cache miss");
                let docs = self.inner.find(collection, query).await?;
                Ok::<_, StoreError>(CacheValue::Docs(Arc::new(docs)))
            })
            .await
            .map_err(|e| (*e).clone())?;

        match value {
            CacheValue::Docs(docs) => Ok(docs.as_ref().clone()),
            CacheValue::Global(_) => Err(StoreError::Decode(
                "request cache returned a global for a find call".to_string(),
            )),
        }
    }

    async fn find_global(&self, slug: &str) -> Result<Option<Document>, StoreError> {
        let value = self
            .cache
            .try_get_with(CacheKey::Global(slug.to_string()), async {
                debug!(slug = %slug, "request cache miss");
                let doc = self.inner.find_global(slug).await?;
                Ok::<_, StoreError>(CacheValue::Global(doc.map(Arc::new)))
            })
            .await
            .map_err(|e| (*e).clone())?;

        match value {
            CacheValue::Global(doc) => Ok(doc.map(|d| d.as_ref().clone())),
            CacheValue::Docs(_) => Err(StoreError::Decode(
                "request cache returned documents for a global call".to_string(),
            )),
        }
    }

    async fn ping(&self) -> bool {
        self.inner.ping().await
    }
}

//! Slug → page document resolution.

use std::fmt;

use tracing::{debug, warn};

use super::page::PageDocument;
use crate::store::{ContentStore, Depth, Query, StoreError};

/// Collections that hold routable pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Pages,
    ServicePages,
}

impl Collection {
    /// Collection slug in the content store.
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Pages => "pages",
            Collection::ServicePages => "service-pages",
        }
    }

    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "pages" => Some(Collection::Pages),
            "service-pages" => Some(Collection::ServicePages),
            _ => None,
        }
    }

    /// Public URL path of a page in this collection.
    pub fn page_path(self, slug: &str) -> String {
        match (self, slug) {
            (Collection::Pages, "home") => "/".to_string(),
            (Collection::Pages, slug) => format!("/{slug}"),
            (Collection::ServicePages, slug) => format!("/services/{slug}"),
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A slug is a single, non-empty path segment.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && !slug.contains('/')
}

/// Looks pages up by slug through any content store.
pub struct PageResolver<'a> {
    store: &'a dyn ContentStore,
}

impl<'a> PageResolver<'a> {
    pub fn new(store: &'a dyn ContentStore) -> Self {
        Self { store }
    }

    /// Resolve `slug` in `collection`. `Ok(None)` means not found.
    pub async fn resolve(
        &self,
        collection: Collection,
        slug: &str,
        depth: Depth,
    ) -> Result<Option<PageDocument>, StoreError> {
        if !is_valid_slug(slug) {
            debug!(collection = %collection, slug = %slug, "rejecting malformed slug");
            return Ok(None);
        }

        let docs = self
            .store
            .find(collection.as_str(), &Query::field_equals("slug", slug, depth))
            .await?;

        if docs.len() > 1 {
            warn!(
                collection = %collection,
                slug = %slug,
                matches = docs.len(),
                "slug matched more than one document, using the first"
            );
        }

        let Some(doc) = docs.into_iter().next() else {
            debug!(collection = %collection, slug = %slug, "page not found");
            return Ok(None);
        };

        serde_json::from_value(doc)
            .map(Some)
            .map_err(|e| StoreError::Decode(format!("{collection}/{slug}: {e}")))
    }

    /// Every document of `collection`, skipping those that do not decode.
    pub async fn list(
        &self,
        collection: Collection,
        depth: Depth,
        limit: u32,
    ) -> Result<Vec<PageDocument>, StoreError> {
        let docs = self
            .store
            .find(collection.as_str(), &Query::all(depth).limit(limit))
            .await?;

        Ok(docs
            .into_iter()
            .filter_map(|doc| match serde_json::from_value::<PageDocument>(doc) {
                Ok(page) => Some(page),
                Err(e) => {
                    warn!(collection = %collection, error = %e, "skipping undecodable document");
                    None
                }
            })
            .collect())
    }
}

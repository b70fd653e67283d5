//! In-memory content store.
//!
//! Backs local development (loaded from a JSON fixtures file) and tests.
//! Documents are stored fully expanded, so the requested depth is ignored.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ContentStore, Document, Query, StoreError};

/// On-disk fixtures format.
///
/// ```json
/// { "collections": { "pages": [ ... ] }, "globals": { "header": { ... } } }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub collections: HashMap<String, Vec<Document>>,
    #[serde(default)]
    pub globals: HashMap<String, Document>,
}

/// Content store holding documents in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryContentStore {
    collections: HashMap<String, Vec<Document>>,
    globals: HashMap<String, Document>,
}

impl MemoryContentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from parsed fixtures.
    pub fn from_fixtures(fixtures: Fixtures) -> Self {
        Self {
            collections: fixtures.collections,
            globals: fixtures.globals,
        }
    }

    /// Load fixtures from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixtures file {}", path.display()))?;
        let fixtures: Fixtures = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse fixtures file {}", path.display()))?;
        debug!(
            collections = fixtures.collections.len(),
            globals = fixtures.globals.len(),
            "loaded content fixtures"
        );
        Ok(Self::from_fixtures(fixtures))
    }

    /// Append a document to a collection.
    pub fn with_document(mut self, collection: &str, doc: Document) -> Self {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(doc);
        self
    }

    /// Set a global document.
    pub fn with_global(mut self, slug: &str, doc: Document) -> Self {
        self.globals.insert(slug.to_string(), doc);
        self
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let Some(docs) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };

        let matching = docs.iter().filter(|doc| match &query.filter {
            Some(f) => doc.get(&f.field).and_then(|v| v.as_str()) == Some(f.value.as_str()),
            None => true,
        });

        let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(matching.take(limit).cloned().collect())
    }

    async fn find_global(&self, slug: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.globals.get(slug).cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::store::Depth;
    use serde_json::json;

    fn store() -> MemoryContentStore {
        MemoryContentStore::new()
            .with_document("pages", json!({ "id": "1", "slug": "home", "title": "Home" }))
            .with_document("pages", json!({ "id": "2", "slug": "about", "title": "About" }))
            .with_document("pages", json!({ "id": "3", "slug": "Home", "title": "Shouty" }))
            .with_global("header", json!({ "navItems": [] }))
    }

    #[tokio::test]
    async fn find_is_exact_and_case_sensitive() {
        let docs = store()
            .find("pages", &Query::field_equals("slug", "home", Depth::DETAIL))
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["id"], "1");
    }

    #[tokio::test]
    async fn find_unknown_collection_is_empty() {
        let docs = store()
            .find("posts", &Query::all(Depth::LISTING))
            .await
            .unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn find_all_respects_limit() {
        let docs = store()
            .find("pages", &Query::all(Depth::LISTING).limit(2))
            .await
            .unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1]["slug"], "about");
    }

    #[tokio::test]
    async fn globals() {
        let s = store();
        assert!(s.find_global("header").await.unwrap().is_some());
        assert!(s.find_global("footer").await.unwrap().is_none());
    }

    #[test]
    fn fixtures_parse_with_missing_sections() {
        let fixtures: Fixtures = serde_json::from_str(r#"{ "globals": {} }"#).unwrap();
        assert!(fixtures.collections.is_empty());
    }
}

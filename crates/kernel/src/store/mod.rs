//! Content store client.
//!
//! The document store is an external collaborator. This module defines the
//! query surface the site needs from it and provides:
//! - `RestContentStore`: Payload-style REST API over HTTP
//! - `MemoryContentStore`: in-process documents, optionally loaded from a fixtures file
//! - `CachedStore`: request-scoped memoization over any store

mod cached;
mod memory;
mod rest;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use cached::{CacheKey, CachedStore};
pub use memory::{Fixtures, MemoryContentStore};
pub use rest::RestContentStore;

/// A raw document as returned by the store.
pub type Document = Value;

/// How deep related documents are expanded by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Depth(pub u8);

impl Depth {
    /// Listing views: relations one level deep.
    pub const LISTING: Depth = Depth(1);
    /// Detail views: relations two levels deep (media inside blocks).
    pub const DETAIL: Depth = Depth(2);
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Exact-match filter on one top-level field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldEquals {
    pub field: String,
    pub value: String,
}

/// A collection query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    pub filter: Option<FieldEquals>,
    pub depth: Depth,
    pub limit: Option<u32>,
}

impl Query {
    /// Match documents whose `field` equals `value` (case-sensitive).
    pub fn field_equals(field: &str, value: &str, depth: Depth) -> Self {
        Self {
            filter: Some(FieldEquals {
                field: field.to_string(),
                value: value.to_string(),
            }),
            depth,
            limit: None,
        }
    }

    /// Match every document in the collection.
    pub fn all(depth: Depth) -> Self {
        Self {
            filter: None,
            depth,
            limit: None,
        }
    }

    /// Cap the number of returned documents.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Errors raised by a content store.
///
/// Messages are flattened to strings so results can be shared through the
/// request cache.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("content store request failed: {0}")]
    Transport(String),

    #[error("content store returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("content store returned an unreadable document: {0}")]
    Decode(String),

    #[error("content store is misconfigured: {0}")]
    Config(String),
}

/// Read-only query interface of the document store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Find documents in `collection` matching `query`, in store order.
    async fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Fetch a singleton global document. `Ok(None)` when it does not exist.
    async fn find_global(&self, slug: &str) -> Result<Option<Document>, StoreError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> bool {
        true
    }
}

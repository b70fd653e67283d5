//! REST client for a Payload-style content API.
//!
//! - `GET {base}/api/{collection}?where[{field}][equals]={value}&depth={d}&limit={n}`
//!   responds with `{ "docs": [...] }`
//! - `GET {base}/api/globals/{slug}?depth={d}` responds with the document,
//!   or 404 when the global does not exist

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{ContentStore, Depth, Document, Query, StoreError};

/// Maximum length of an error body carried into `StoreError::Status`.
const MAX_ERROR_BODY: usize = 512;

/// Content store backed by the CMS REST API.
#[derive(Debug, Clone)]
pub struct RestContentStore {
    client: reqwest::Client,
    base_url: Url,
    auth: Option<String>,
}

#[derive(Deserialize)]
struct FindResponse {
    #[serde(default)]
    docs: Vec<Document>,
}

impl RestContentStore {
    /// Create a client for the API rooted at `base_url`.
    pub fn new(base_url: Url, auth: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build content API HTTP client")?;
        Ok(Self {
            client,
            base_url,
            auth,
        })
    }

    /// Build `{base}/api/{segments...}`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::Config(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    fn get(&self, url: Url) -> reqwest::RequestBuilder {
        let req = self.client.get(url);
        match &self.auth {
            Some(auth) => req.header(AUTHORIZATION, auth),
            None => req,
        }
    }

    /// Query parameters for a collection query.
    pub(crate) fn query_params(query: &Query) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(3);
        if let Some(f) = &query.filter {
            params.push((format!("where[{}][equals]", f.field), f.value.clone()));
        }
        params.push(("depth".to_string(), query.depth.to_string()));
        if let Some(limit) = query.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

async fn status_error(response: reqwest::Response) -> StoreError {
    let status = response.status().as_u16();
    let mut message = response.text().await.unwrap_or_default();
    if message.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
    }
    StoreError::Status { status, message }
}

fn transport(e: reqwest::Error) -> StoreError {
    StoreError::Transport(e.to_string())
}

#[async_trait]
impl ContentStore for RestContentStore {
    async fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let url = self.endpoint(&[collection])?;
        debug!(%url, collection = %collection, "content store find");

        let response = self
            .get(url)
            .query(&Self::query_params(query))
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body: FindResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(body.docs)
    }

    async fn find_global(&self, slug: &str) -> Result<Option<Document>, StoreError> {
        let url = self.endpoint(&["globals", slug])?;
        debug!(%url, slug = %slug, "content store find_global");

        let response = self
            .get(url)
            .query(&[("depth", Depth::LISTING.to_string())])
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let doc: Document = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(Some(doc))
    }

    async fn ping(&self) -> bool {
        match self.endpoint(&["globals", "header"]) {
            Ok(url) => self.get(url).send().await.is_ok(),
            Err(_) => false,
        }
    }
}

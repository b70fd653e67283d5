//! Delivery of contact form submissions.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Shown when a rejection carries no readable body.
pub const UNREADABLE_REJECTION: &str = "Failed to submit form. Please try again.";
/// Shown when a rejection body has no usable `message`.
pub const GENERIC_REJECTION: &str = "Failed to submit form";
/// Shown when a transport failure has no message of its own.
pub const UNEXPECTED_FAILURE: &str = "An unexpected error occurred";

/// Why a submission did not go through. The message is shown to the visitor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// The endpoint answered with a non-success status.
    #[error("{0}")]
    Rejected(String),

    /// The request never completed.
    #[error("{0}")]
    Network(String),
}

/// Sends a form payload (field name → string or bool) somewhere.
#[async_trait]
pub trait SubmissionClient: Send + Sync {
    async fn submit(&self, payload: &Map<String, Value>) -> Result<(), SubmissionError>;
}

/// POSTs submissions as JSON to a configured endpoint.
#[derive(Debug, Clone)]
pub struct HttpSubmissionClient {
    client: reqwest::Client,
    endpoint: Url,
}

#[derive(Deserialize)]
struct RejectionBody {
    #[serde(default)]
    message: Option<String>,
}

impl HttpSubmissionClient {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build submission HTTP client")?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Message for a non-success response body.
pub(crate) fn rejection_message(body: &[u8]) -> String {
    match serde_json::from_slice::<RejectionBody>(body) {
        Ok(RejectionBody {
            message: Some(message),
        }) if !message.is_empty() => message,
        Ok(_) => GENERIC_REJECTION.to_string(),
        Err(_) => UNREADABLE_REJECTION.to_string(),
    }
}

#[async_trait]
impl SubmissionClient for HttpSubmissionClient {
    async fn submit(&self, payload: &Map<String, Value>) -> Result<(), SubmissionError> {
        debug!(endpoint = %self.endpoint, fields = payload.len(), "submitting contact form");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "contact form submission failed");
                let message = e.to_string();
                SubmissionError::Network(if message.is_empty() {
                    UNEXPECTED_FAILURE.to_string()
                } else {
                    message
                })
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.bytes().await.unwrap_or_default();
        let message = rejection_message(&body);
        warn!(status = status.as_u16(), message = %message, "contact form submission rejected");
        Err(SubmissionError::Rejected(message))
    }
}

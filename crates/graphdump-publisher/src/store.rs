//! Triple store access.
//!
//! The pipeline only needs two primitives: run a SELECT and get rows back, or
//! run an update and wait for it. [`SparqlClient`] implements them over the
//! SPARQL 1.1 protocol.

use async_trait::async_trait;
use graphdump_core::{CoreError, QueryResults};
use thiserror::Error;
use tracing::debug;

/// Errors talking to the triple store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status.
    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Malformed result document.
    #[error("invalid query results: {0}")]
    Results(#[from] CoreError),
}

/// Query and update primitives against the store.
#[async_trait]
pub trait Store: Send + Sync {
    async fn query(&self, query: &str) -> Result<QueryResults, StoreError>;

    async fn update(&self, update: &str) -> Result<(), StoreError>;
}

/// SPARQL protocol client.
///
/// Requests carry `mu-auth-sudo: true` so the authorization layer in front of
/// the store does not scope them to a session.
pub struct SparqlClient {
    inner: reqwest::Client,
    endpoint: String,
}

impl SparqlClient {
    /// Create a new client for `endpoint`.
    pub fn new(endpoint: &str) -> Self {
        Self {
            inner: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    async fn post(&self, query: &str) -> Result<String, StoreError> {
        let response = self
            .inner
            .post(&self.endpoint)
            .header("mu-auth-sudo", "true")
            .header(reqwest::header::ACCEPT, "application/sparql-results+json")
            .form(&[("query", query)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl Store for SparqlClient {
    async fn query(&self, query: &str) -> Result<QueryResults, StoreError> {
        debug!(endpoint = %self.endpoint, len = query.len(), "SPARQL query");
        let body = self.post(query).await?;
        Ok(QueryResults::parse(&body)?)
    }

    async fn update(&self, update: &str) -> Result<(), StoreError> {
        debug!(endpoint = %self.endpoint, len = update.len(), "SPARQL update");
        self.post(update).await.map(|_| ())
    }
}

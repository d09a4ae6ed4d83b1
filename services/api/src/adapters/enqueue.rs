//! services/api/src/adapters/enqueue.rs
//!
//! This module contains the adapter that notifies the analysis worker over HTTP.
//! It implements the `JobEnqueuer` port from the `core` crate.

use async_trait::async_trait;
use palabra_core::ports::{JobEnqueuer, PortError, PortResult};
use std::time::Duration;
use uuid::Uuid;

/// Posts `book_id` and `filename` as query parameters to the worker's
/// enqueue endpoint.
#[derive(Clone)]
pub struct HttpJobEnqueuer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpJobEnqueuer {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl JobEnqueuer for HttpJobEnqueuer {
    async fn enqueue(&self, book_id: Uuid, stored_key: &str) -> PortResult<()> {
        let book_id = book_id.to_string();
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("book_id", book_id.as_str()), ("filename", stored_key)])
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("worker unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PortError::Unexpected(format!(
                "enqueue request returned status {}",
                status
            )));
        }
        Ok(())
    }
}

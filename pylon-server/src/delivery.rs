//! Outbound delivery seam.
//!
//! Workers call through the [`Deliverer`] trait so tests can substitute
//! a recording fake. The production implementation posts the activity
//! to the destination inbox over HTTPS; request signing happens in the
//! transport layer and is not modeled here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, header};
use serde_json::Value;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("destination rejected delivery with status {0}")]
    Rejected(StatusCode),
}

/// One signed outbound delivery to one inbox.
#[async_trait]
pub trait Deliverer: Send + Sync {
    async fn deliver(&self, inbox: &Url, message: &Value) -> Result<(), DeliveryError>;
}

/// HTTP delivery client shared by all workers.
#[derive(Debug, Clone)]
pub struct HttpDeliverer {
    client: reqwest::Client,
}

impl HttpDeliverer {
    /// The client enforces its own per-request timeout; the dispatch
    /// core adds none on top.
    pub fn new(user_agent: &str) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Deliverer for HttpDeliverer {
    async fn deliver(&self, inbox: &Url, message: &Value) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(inbox.clone())
            .header(header::CONTENT_TYPE, "application/activity+json")
            .json(message)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DeliveryError::Rejected(response.status()));
        }

        Ok(())
    }
}

//! Message-bus publisher collaborator
//!
//! Finished records leave the scraper as one JSON item per bill or event,
//! published to a topic (`"bills"` / `"events"`) keyed by jurisdiction.
//! The publisher is shared across workers and serializes writes internally.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use legiwire_common::config::PublisherConfig;

/// Publisher errors
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("publish network error: {0}")]
    Network(String),

    #[error("publish error {0}: {1}")]
    Api(u16, String),
}

/// Publishing seam
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish one JSON record
    ///
    /// The payload is already rendered with the fixed wire encoder; the
    /// publisher does not re-serialize dates.
    async fn publish_json_item(
        &self,
        routing_key: &str,
        topic: &str,
        locality: &str,
        payload: &serde_json::Value,
    ) -> Result<(), PublishError>;
}

/// HTTP implementation posting to the bus gateway
pub struct HttpPublisher {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct PublishRequest<'a> {
    routing_key: &'a str,
    topic: &'a str,
    locality: &'a str,
    payload: &'a serde_json::Value,
}

impl HttpPublisher {
    pub fn new(config: &PublisherConfig) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| PublishError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Publisher for HttpPublisher {
    async fn publish_json_item(
        &self,
        routing_key: &str,
        topic: &str,
        locality: &str,
        payload: &serde_json::Value,
    ) -> Result<(), PublishError> {
        let url = format!("{}/publish", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&PublishRequest {
                routing_key,
                topic,
                locality,
                payload,
            })
            .send()
            .await
            .map_err(|e| PublishError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PublishError::Api(status.as_u16(), text));
        }

        tracing::debug!(topic = topic, routing_key = routing_key, "Published item");
        Ok(())
    }
}

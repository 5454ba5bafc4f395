//! Locality-metadata collaborator
//!
//! Answers two questions: is a requested session id known, and which
//! sessions are current or upcoming for a locality (the suggestion set
//! surfaced on an invalid-session failure).

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use legiwire_common::config::MetadataConfig;

/// Metadata client errors
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("metadata network error: {0}")]
    Network(String),

    #[error("metadata error {0}: {1}")]
    Api(u16, String),

    #[error("metadata parse error: {0}")]
    Parse(String),
}

/// One legislative session as known to the metadata service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub locality: String,
    /// Internal session id, e.g. `20252026r`
    pub id: String,
    /// Human-readable name, e.g. "2025-2026 Regular Session"
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

/// Metadata RPC surface
#[async_trait]
pub trait MetadataClient: Send + Sync {
    /// Look up a session by internal id; `None` when unknown
    async fn get_session(
        &self,
        locality: &str,
        id: &str,
    ) -> Result<Option<SessionRecord>, MetadataError>;

    /// Sessions active on or after `date`, for invalid-session suggestions
    async fn find_current_and_future_sessions(
        &self,
        locality: &str,
        date: NaiveDate,
    ) -> Result<Vec<SessionRecord>, MetadataError>;
}

/// HTTP implementation of the metadata protocol
///
/// The wire RPCs carry `priority` and `requester` fields; both are
/// transport details filled from config (requester = configured scraper
/// name, priority = "interactive" since these are run prechecks).
pub struct HttpMetadataClient {
    client: reqwest::Client,
    base_url: String,
    requester: String,
}

#[derive(Serialize)]
struct GetSessionRequest<'a> {
    locality: &'a str,
    id: &'a str,
    priority: &'a str,
    requester: &'a str,
}

#[derive(Serialize)]
struct FindSessionsRequest<'a> {
    locality: &'a str,
    date: NaiveDate,
    requester: &'a str,
}

impl HttpMetadataClient {
    pub fn new(config: &MetadataConfig) -> Result<Self, MetadataError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| MetadataError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            requester: config.requester.clone(),
        })
    }

    async fn post_json<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, MetadataError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| MetadataError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(MetadataError::Api(status.as_u16(), text));
        }
        response
            .json()
            .await
            .map_err(|e| MetadataError::Parse(e.to_string()))
    }
}

#[async_trait]
impl MetadataClient for HttpMetadataClient {
    async fn get_session(
        &self,
        locality: &str,
        id: &str,
    ) -> Result<Option<SessionRecord>, MetadataError> {
        self.post_json(
            "/session/get",
            &GetSessionRequest {
                locality,
                id,
                priority: "interactive",
                requester: &self.requester,
            },
        )
        .await
    }

    async fn find_current_and_future_sessions(
        &self,
        locality: &str,
        date: NaiveDate,
    ) -> Result<Vec<SessionRecord>, MetadataError> {
        self.post_json(
            "/session/find_current_and_future",
            &FindSessionsRequest {
                locality,
                date,
                requester: &self.requester,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_record_deserializes_without_dates() {
        let record: SessionRecord = serde_json::from_str(
            r#"{"locality": "ak", "id": "20252026r", "name": "2025-2026 Regular Session"}"#,
        )
        .unwrap();
        assert_eq!(record.id, "20252026r");
        assert!(record.start_date.is_none());
    }

    #[test]
    fn test_request_carries_requester_and_priority() {
        let request = GetSessionRequest {
            locality: "ak",
            id: "2025r",
            priority: "interactive",
            requester: "ak-scraper",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["priority"], "interactive");
        assert_eq!(json["requester"], "ak-scraper");
    }
}

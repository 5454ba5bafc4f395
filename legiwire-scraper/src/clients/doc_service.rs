//! Document-service collaborator
//!
//! The document service stores binaries content-addressed and extracts
//! text. The core calls four RPCs: `last_download_info` (dedup lookup),
//! `upload_to_s3`, `register_s3_url`, and `extract_and_register_documents`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use legiwire_common::config::DocServiceConfig;

/// Document-service client errors
#[derive(Debug, Error)]
pub enum DocServiceError {
    #[error("doc service network error: {0}")]
    Network(String),

    #[error("doc service error {0}: {1}")]
    Api(u16, String),

    #[error("doc service parse error: {0}")]
    Parse(String),
}

/// One extracted text document
///
/// `additional_data` is an opaque map used to thread parser-produced values
/// (e.g. a recovered vote tally) back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedDocument {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<serde_json::Map<String, serde_json::Value>>,
}

impl ScrapedDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            additional_data: None,
        }
    }
}

/// Prior registration state for a URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadInfo {
    pub datetime: DateTime<Utc>,
    /// SHA-256 hex of the (projected) body at registration time
    pub hash: String,
    /// Download id of the registered binary
    pub id: i64,
    #[serde(default)]
    pub document_ids: Vec<i64>,
    #[serde(default)]
    pub documents: Vec<ScrapedDocument>,
}

/// Parameters for `register_s3_url`
#[derive(Debug, Clone, Serialize)]
pub struct RegisterS3Request {
    pub policy: String,
    pub s3_url: String,
    pub original_url: String,
    pub hash: String,
    pub serve_from_s3: bool,
    pub mimetype: String,
    pub encoding: Option<String>,
    pub headers: Vec<(String, String)>,
}

/// Parameters for `extract_and_register_documents`
#[derive(Debug, Clone, Serialize)]
pub struct ExtractRequest {
    pub extraction_type: String,
    pub policy: String,
    pub url: String,
    pub download_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_spec: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloaded_file: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
}

/// Document-service RPC surface
///
/// Shared across workers; implementations must be safe for concurrent use.
#[async_trait]
pub trait DocServiceClient: Send + Sync {
    /// Most recent registration for a URL, if any
    async fn last_download_info(&self, url: &str)
        -> Result<Option<DownloadInfo>, DocServiceError>;

    /// Upload a body to the content-addressed store; returns the S3 URL
    async fn upload_to_s3(
        &self,
        url: &str,
        body: &[u8],
        hash: &str,
        mimetype: &str,
    ) -> Result<String, DocServiceError>;

    /// Register an uploaded binary; returns the download id
    async fn register_s3_url(&self, request: &RegisterS3Request)
        -> Result<i64, DocServiceError>;

    /// Dispatch text extraction for a registered binary
    async fn extract_and_register_documents(
        &self,
        request: &ExtractRequest,
    ) -> Result<(Vec<ScrapedDocument>, Vec<i64>), DocServiceError>;
}

/// HTTP implementation of the document-service protocol
pub struct HttpDocServiceClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDocServiceClient {
    pub fn new(config: &DocServiceConfig) -> Result<Self, DocServiceError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| DocServiceError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_json<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, DocServiceError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| DocServiceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(DocServiceError::Api(status.as_u16(), text));
        }
        response
            .json()
            .await
            .map_err(|e| DocServiceError::Parse(e.to_string()))
    }
}

#[derive(Serialize)]
struct UrlQuery<'a> {
    url: &'a str,
}

#[derive(Serialize)]
struct UploadRequest<'a> {
    url: &'a str,
    #[serde(with = "body_base64")]
    body: &'a [u8],
    hash: &'a str,
    mimetype: &'a str,
}

/// Binary bodies travel as base64 strings
mod body_base64 {
    use base64::{engine::general_purpose, Engine as _};
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bytes: &&[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&general_purpose::STANDARD.encode(bytes))
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    s3_url: String,
}

#[derive(Deserialize)]
struct RegisterResponse {
    download_id: i64,
}

#[derive(Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    documents: Vec<ScrapedDocument>,
    #[serde(default)]
    document_ids: Vec<i64>,
}

#[async_trait]
impl DocServiceClient for HttpDocServiceClient {
    async fn last_download_info(
        &self,
        url: &str,
    ) -> Result<Option<DownloadInfo>, DocServiceError> {
        self.post_json("/download/last_info", &UrlQuery { url }).await
    }

    async fn upload_to_s3(
        &self,
        url: &str,
        body: &[u8],
        hash: &str,
        mimetype: &str,
    ) -> Result<String, DocServiceError> {
        let response: UploadResponse = self
            .post_json(
                "/download/upload",
                &UploadRequest {
                    url,
                    body,
                    hash,
                    mimetype,
                },
            )
            .await?;
        Ok(response.s3_url)
    }

    async fn register_s3_url(
        &self,
        request: &RegisterS3Request,
    ) -> Result<i64, DocServiceError> {
        let response: RegisterResponse =
            self.post_json("/download/register", request).await?;
        Ok(response.download_id)
    }

    async fn extract_and_register_documents(
        &self,
        request: &ExtractRequest,
    ) -> Result<(Vec<ScrapedDocument>, Vec<i64>), DocServiceError> {
        let response: ExtractResponse = self.post_json("/document/extract", request).await?;
        Ok((response.documents, response.document_ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_info_deserializes_with_defaults() {
        let info: DownloadInfo = serde_json::from_str(
            r#"{"datetime": "2025-01-10T00:00:00Z", "hash": "abc", "id": 42}"#,
        )
        .unwrap();
        assert_eq!(info.id, 42);
        assert!(info.document_ids.is_empty());
        assert!(info.documents.is_empty());
    }

    #[test]
    fn test_upload_body_is_base64() {
        let request = UploadRequest {
            url: "http://x",
            body: b"hi!",
            hash: "h",
            mimetype: "text/plain",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["body"], "aGkh");

        let padded = UploadRequest {
            body: b"hi",
            ..request
        };
        assert_eq!(serde_json::to_value(&padded).unwrap()["body"], "aGk=");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HttpDocServiceClient::new(&DocServiceConfig {
            base_url: "http://docs.test/".to_string(),
        })
        .unwrap();
        assert_eq!(client.base_url, "http://docs.test");
    }
}

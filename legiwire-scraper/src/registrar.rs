//! Document registrar
//!
//! Mediates the document-service protocol for adapters: fetch a URL, hash
//! the (projected) content, reuse a prior registration when the hash is
//! unchanged, otherwise upload and register, and optionally dispatch text
//! extraction. Failures are result values scoped to the single artifact;
//! nothing here aborts a bill or a run.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::clients::{
    DocServiceClient, ExtractRequest, Fetcher, RegisterS3Request, ScrapedDocument,
};
use crate::context::RegistrarOptions;
use legiwire_common::events::{EventBus, ScrapeEvent};

/// Declared extraction strategy for a registered binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionType {
    TextPdf,
    Html,
    Text,
    Unknown,
}

impl ExtractionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionType::TextPdf => "text_pdf",
            ExtractionType::Html => "html",
            ExtractionType::Text => "text",
            ExtractionType::Unknown => "unknown",
        }
    }
}

/// Projector that strips URL-unique or timestamped noise before hashing
///
/// Required for pages whose bytes change every request even when the
/// logical content is stable (rotating ids, print markers); the projection
/// makes the dedup key stable across runs.
pub type ContentProjector = Arc<dyn Fn(&[u8]) -> Vec<u8> + Send + Sync>;

/// Parser applied to the extracted documents before they are returned
///
/// First-class function, handed the service's extraction output; returns
/// the documents to keep, with `additional_data` threading recovered values
/// (e.g. a vote tally) back to the caller.
pub type DocumentParser = Arc<dyn Fn(&[ScrapedDocument]) -> Vec<ScrapedDocument> + Send + Sync>;

/// One registration request
#[derive(Clone)]
pub struct RegistrationRequest {
    pub url: String,
    /// Reporting policy name attached to doc-service calls
    pub policy: String,
    pub extraction_type: ExtractionType,
    /// Overrides the mimetype reported by the fetch when set
    pub mimetype: Option<String>,
    pub serve_from_s3: bool,
    /// Flag label matched against `--extraction-flag` to force re-extraction
    pub flag: Option<String>,
    pub get_static_content: Option<ContentProjector>,
    pub parser: Option<DocumentParser>,
    pub column_spec: Option<serde_json::Value>,
}

impl RegistrationRequest {
    pub fn new(url: impl Into<String>, extraction_type: ExtractionType) -> Self {
        Self {
            url: url.into(),
            policy: "doc_service".to_string(),
            extraction_type,
            mimetype: None,
            serve_from_s3: true,
            flag: None,
            get_static_content: None,
            parser: None,
            column_spec: None,
        }
    }

    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.policy = policy.into();
        self
    }

    pub fn with_mimetype(mut self, mimetype: impl Into<String>) -> Self {
        self.mimetype = Some(mimetype.into());
        self
    }

    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flag = Some(flag.into());
        self
    }

    pub fn with_static_content(mut self, projector: ContentProjector) -> Self {
        self.get_static_content = Some(projector);
        self
    }

    pub fn with_parser(mut self, parser: DocumentParser) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn with_column_spec(mut self, spec: serde_json::Value) -> Self {
        self.column_spec = Some(spec);
        self
    }
}

/// Outcome of one registration attempt
///
/// A failed artifact is reported and omitted from the Bill; the bill still
/// publishes.
#[derive(Debug, Clone)]
pub enum DownloadResult {
    Ok {
        download_id: i64,
        /// Extracted-text handle; `None` for partial registrations and
        /// failed extractions
        document_id: Option<i64>,
        documents: Vec<ScrapedDocument>,
        document_ids: Vec<i64>,
        /// True when a prior registration was reused without uploading
        deduplicated: bool,
    },
    Failed {
        reason: String,
    },
}

impl DownloadResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, DownloadResult::Ok { .. })
    }

    pub fn download_id(&self) -> Option<i64> {
        match self {
            DownloadResult::Ok { download_id, .. } => Some(*download_id),
            DownloadResult::Failed { .. } => None,
        }
    }
}

/// Outcome of the download-and-register phase, before extraction
struct Registered {
    download_id: i64,
    body: Vec<u8>,
    /// Prior extraction reused via the hash short-circuit
    prior_documents: Option<(Vec<ScrapedDocument>, Vec<i64>)>,
}

/// The registrar bound to one context's clients
pub struct DocumentRegistrar {
    fetcher: Arc<dyn Fetcher>,
    doc_service: Arc<dyn DocServiceClient>,
    event_bus: Arc<EventBus>,
    options: RegistrarOptions,
}

impl DocumentRegistrar {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        doc_service: Arc<dyn DocServiceClient>,
        event_bus: Arc<EventBus>,
        options: RegistrarOptions,
    ) -> Self {
        Self {
            fetcher,
            doc_service,
            event_bus,
            options,
        }
    }

    /// Register a URL and dispatch text extraction
    ///
    /// **Flow:**
    /// 1. Fetch the body and apply the `get_static_content` projector.
    /// 2. SHA-256 the projected body; consult `last_download_info`. A prior
    ///    registration with the same hash and at least one extracted
    ///    document handle is reused outright (per-URL idempotency across
    ///    runs), unless the request's flag matches `--extraction-flag`.
    /// 3. Otherwise upload to the content-addressed store and register.
    /// 4. Dispatch extraction; an extraction failure degrades to an empty
    ///    `document_ids` list rather than failing the artifact.
    pub async fn register_and_extract(&self, request: &RegistrationRequest) -> DownloadResult {
        let registered = match self.download_and_register(request).await {
            Ok(r) => r,
            Err(reason) => return self.failed(&request.url, reason),
        };

        if let Some((documents, document_ids)) = registered.prior_documents {
            let documents = self.apply_parser(request, documents);
            return DownloadResult::Ok {
                download_id: registered.download_id,
                document_id: document_ids.first().copied(),
                documents,
                document_ids,
                deduplicated: true,
            };
        }

        let extract = ExtractRequest {
            extraction_type: request.extraction_type.as_str().to_string(),
            policy: request.policy.clone(),
            url: request.url.clone(),
            download_id: registered.download_id,
            column_spec: request.column_spec.clone(),
            downloaded_file: Some(registered.body),
            extracted_text: None,
        };

        let (documents, document_ids) =
            match self.doc_service.extract_and_register_documents(&extract).await {
                Ok(result) => result,
                Err(e) => {
                    // Extraction failure: binary stays registered, caller
                    // may downgrade the record to partial or drop it
                    tracing::warn!(
                        url = %request.url,
                        download_id = registered.download_id,
                        error = %e,
                        "Text extraction failed; returning registration without documents"
                    );
                    (Vec::new(), Vec::new())
                }
            };

        let documents = self.apply_parser(request, documents);
        DownloadResult::Ok {
            download_id: registered.download_id,
            document_id: document_ids.first().copied(),
            documents,
            document_ids,
            deduplicated: false,
        }
    }

    /// Register a single-artifact page, asserting exactly one extracted id
    pub async fn register_one(&self, request: &RegistrationRequest) -> DownloadResult {
        let result = self.register_and_extract(request).await;
        if let DownloadResult::Ok {
            ref document_ids, ..
        } = result
        {
            if document_ids.len() != 1 {
                return self.failed(
                    &request.url,
                    format!(
                        "expected exactly 1 extracted document, got {}",
                        document_ids.len()
                    ),
                );
            }
        }
        result
    }

    /// Download-and-register without extraction; yields only a download id
    ///
    /// For artifacts whose text is not worth extracting (audio, images,
    /// large PDFs off the critical path).
    pub async fn partial_register(&self, request: &RegistrationRequest) -> DownloadResult {
        match self.download_and_register(request).await {
            Ok(registered) => DownloadResult::Ok {
                download_id: registered.download_id,
                document_id: None,
                documents: Vec::new(),
                document_ids: Vec::new(),
                deduplicated: registered.prior_documents.is_some(),
            },
            Err(reason) => self.failed(&request.url, reason),
        }
    }

    async fn download_and_register(
        &self,
        request: &RegistrationRequest,
    ) -> Result<Registered, String> {
        let fetched = self
            .fetcher
            .fetch(&request.url)
            .await
            .map_err(|e| format!("download failed: {}", e))?;

        let body = match &request.get_static_content {
            Some(projector) => projector(&fetched.body),
            None => fetched.body.clone(),
        };
        let hash = format!("{:x}", Sha256::digest(&body));
        let mimetype = request
            .mimetype
            .clone()
            .unwrap_or_else(|| fetched.mimetype.clone());

        // Hash short-circuit: same content, already extracted
        if !self.force_reextract(request) {
            match self.doc_service.last_download_info(&request.url).await {
                Ok(Some(prior)) if prior.hash == hash && !prior.document_ids.is_empty() => {
                    tracing::debug!(
                        url = %request.url,
                        download_id = prior.id,
                        "Content unchanged since last registration; reusing"
                    );
                    self.event_bus.emit_lossy(ScrapeEvent::DocumentRegistered {
                        url: request.url.clone(),
                        download_id: prior.id,
                        deduplicated: true,
                        timestamp: Utc::now(),
                    });
                    return Ok(Registered {
                        download_id: prior.id,
                        body,
                        prior_documents: Some((prior.documents, prior.document_ids)),
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    // Lookup failure only costs the dedup; registration proceeds
                    tracing::warn!(url = %request.url, error = %e, "last_download_info failed");
                }
            }
        }

        let s3_url = self
            .doc_service
            .upload_to_s3(&request.url, &body, &hash, &mimetype)
            .await
            .map_err(|e| format!("upload failed: {}", e))?;

        let download_id = self
            .doc_service
            .register_s3_url(&RegisterS3Request {
                policy: request.policy.clone(),
                s3_url,
                original_url: request.url.clone(),
                hash: hash.clone(),
                serve_from_s3: request.serve_from_s3,
                mimetype: mimetype.clone(),
                encoding: fetched.encoding.clone(),
                headers: fetched.headers,
            })
            .await
            .map_err(|e| format!("registration failed: {}", e))?;

        // Integrity check on the content-addressed upload, unless skipped
        if !self.options.s3_skip_checks {
            match self.doc_service.last_download_info(&request.url).await {
                Ok(Some(info)) if info.hash != hash => {
                    return Err(format!(
                        "upload integrity check failed: stored hash {} != {}",
                        info.hash, hash
                    ));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(url = %request.url, error = %e, "Integrity check skipped: lookup failed");
                }
            }
        }

        tracing::info!(
            url = %request.url,
            download_id = download_id,
            hash = %hash,
            "Registered document"
        );
        self.event_bus.emit_lossy(ScrapeEvent::DocumentRegistered {
            url: request.url.clone(),
            download_id,
            deduplicated: false,
            timestamp: Utc::now(),
        });

        Ok(Registered {
            download_id,
            body,
            prior_documents: None,
        })
    }

    /// True when `--extraction-flag` matches this request's flag label
    fn force_reextract(&self, request: &RegistrationRequest) -> bool {
        matches!(
            (&self.options.extraction_flag, &request.flag),
            (Some(forced), Some(flag)) if forced == flag
        )
    }

    fn apply_parser(
        &self,
        request: &RegistrationRequest,
        documents: Vec<ScrapedDocument>,
    ) -> Vec<ScrapedDocument> {
        match &request.parser {
            Some(parser) => parser(&documents),
            None => documents,
        }
    }

    fn failed(&self, url: &str, reason: String) -> DownloadResult {
        tracing::warn!(url = url, reason = %reason, "Document registration failed");
        self.event_bus.emit_lossy(ScrapeEvent::DocumentFailed {
            url: url.to_string(),
            reason: reason.clone(),
            timestamp: Utc::now(),
        });
        DownloadResult::Failed { reason }
    }
}

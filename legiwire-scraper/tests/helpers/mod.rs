//! Shared test infrastructure: mock collaborators and a scripted adapter

// Each test binary uses a different subset of the helpers
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sha2::{Digest, Sha256};

use legiwire_common::bill_id::NormalizedBillId;
use legiwire_common::events::EventBus;
use legiwire_common::models::Bill;
use legiwire_scraper::adapter::{
    BillContext, Enumeration, ExpectedError, JurisdictionScraper,
};
use legiwire_scraper::clients::{
    DocServiceClient, DocServiceError, DownloadInfo, ExtractRequest, FetchError, FetchedContent,
    Fetcher, MetadataClient, MetadataError, PublishError, Publisher, RegisterS3Request,
    ScrapedDocument, SessionRecord,
};
use legiwire_scraper::context::ScrapeContext;

/// In-memory document service with a per-URL registration ledger
///
/// `register_s3_url` records the uploaded hash so `last_download_info`
/// reproduces the dedup short-circuit across "runs", and the integrity
/// check after upload sees a consistent hash.
#[derive(Default)]
pub struct MockDocService {
    state: Mutex<HashMap<String, DownloadInfo>>,
    pub uploads: AtomicUsize,
    pub registers: AtomicUsize,
    pub extracts: AtomicUsize,
    next_download_id: AtomicI64,
    next_document_id: AtomicI64,
    pub fail_extraction: AtomicBool,
}

impl MockDocService {
    pub fn new() -> Self {
        Self {
            next_download_id: AtomicI64::new(100),
            next_document_id: AtomicI64::new(500),
            ..Self::default()
        }
    }

    /// Seed a prior registration as a previous run would have left it
    pub fn seed_prior(&self, url: &str, body: &[u8], document_ids: Vec<i64>) -> i64 {
        let download_id = self.next_download_id.fetch_add(1, Ordering::SeqCst);
        let info = DownloadInfo {
            datetime: Utc::now(),
            hash: format!("{:x}", Sha256::digest(body)),
            id: download_id,
            documents: document_ids
                .iter()
                .map(|_| ScrapedDocument::new(format!("prior text of {}", url)))
                .collect(),
            document_ids,
        };
        self.state.lock().unwrap().insert(url.to_string(), info);
        download_id
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn extract_count(&self) -> usize {
        self.extracts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocServiceClient for MockDocService {
    async fn last_download_info(
        &self,
        url: &str,
    ) -> Result<Option<DownloadInfo>, DocServiceError> {
        Ok(self.state.lock().unwrap().get(url).cloned())
    }

    async fn upload_to_s3(
        &self,
        _url: &str,
        _body: &[u8],
        hash: &str,
        _mimetype: &str,
    ) -> Result<String, DocServiceError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(format!("s3://mock/{}", hash))
    }

    async fn register_s3_url(
        &self,
        request: &RegisterS3Request,
    ) -> Result<i64, DocServiceError> {
        self.registers.fetch_add(1, Ordering::SeqCst);
        let download_id = self.next_download_id.fetch_add(1, Ordering::SeqCst);
        self.state.lock().unwrap().insert(
            request.original_url.clone(),
            DownloadInfo {
                datetime: Utc::now(),
                hash: request.hash.clone(),
                id: download_id,
                document_ids: Vec::new(),
                documents: Vec::new(),
            },
        );
        Ok(download_id)
    }

    async fn extract_and_register_documents(
        &self,
        request: &ExtractRequest,
    ) -> Result<(Vec<ScrapedDocument>, Vec<i64>), DocServiceError> {
        self.extracts.fetch_add(1, Ordering::SeqCst);
        if self.fail_extraction.load(Ordering::SeqCst) {
            return Err(DocServiceError::Api(500, "extraction worker crashed".into()));
        }
        let document_id = self.next_document_id.fetch_add(1, Ordering::SeqCst);
        let document = ScrapedDocument::new(format!("extracted text of {}", request.url));
        if let Some(info) = self.state.lock().unwrap().get_mut(&request.url) {
            info.document_ids.push(document_id);
            info.documents.push(document.clone());
        }
        Ok((vec![document], vec![document_id]))
    }
}

/// Metadata service with a fixed session table
pub struct MockMetadata {
    known: Vec<SessionRecord>,
}

impl MockMetadata {
    pub fn with_sessions(locality: &str, ids: &[&str]) -> Self {
        Self {
            known: ids
                .iter()
                .map(|id| SessionRecord {
                    locality: locality.to_string(),
                    id: id.to_string(),
                    name: format!("Session {}", id),
                    start_date: NaiveDate::from_ymd_opt(2025, 1, 1),
                    end_date: None,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl MetadataClient for MockMetadata {
    async fn get_session(
        &self,
        locality: &str,
        id: &str,
    ) -> Result<Option<SessionRecord>, MetadataError> {
        Ok(self
            .known
            .iter()
            .find(|s| s.locality == locality && s.id == id)
            .cloned())
    }

    async fn find_current_and_future_sessions(
        &self,
        locality: &str,
        _date: NaiveDate,
    ) -> Result<Vec<SessionRecord>, MetadataError> {
        Ok(self
            .known
            .iter()
            .filter(|s| s.locality == locality)
            .cloned()
            .collect())
    }
}

/// Publisher that records every published item
#[derive(Default)]
pub struct RecordingPublisher {
    items: Mutex<Vec<(String, String, serde_json::Value)>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(topic, locality, payload)` in publish order
    pub fn items(&self) -> Vec<(String, String, serde_json::Value)> {
        self.items.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish_json_item(
        &self,
        _routing_key: &str,
        topic: &str,
        locality: &str,
        payload: &serde_json::Value,
    ) -> Result<(), PublishError> {
        self.items.lock().unwrap().push((
            topic.to_string(),
            locality.to_string(),
            payload.clone(),
        ));
        Ok(())
    }
}

/// Fetcher serving scripted page bodies
#[derive(Default)]
pub struct MockFetcher {
    pages: Mutex<HashMap<String, Vec<u8>>>,
    failing: Mutex<HashSet<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, body: &[u8]) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), body.to_vec());
    }

    pub fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedContent, FetchError> {
        if self.failing.lock().unwrap().contains(url) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 503,
            });
        }
        match self.pages.lock().unwrap().get(url) {
            Some(body) => Ok(FetchedContent {
                body: body.clone(),
                mimetype: "text/html".to_string(),
                encoding: Some("utf-8".to_string()),
                headers: vec![("content-type".to_string(), "text/html".to_string())],
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// Bundle of mocks wired into one ScrapeContext
pub struct TestHarness {
    pub doc_service: Arc<MockDocService>,
    pub metadata: Arc<MockMetadata>,
    pub publisher: Arc<RecordingPublisher>,
    pub fetcher: Arc<MockFetcher>,
    pub event_bus: Arc<EventBus>,
}

impl TestHarness {
    pub fn new(locality: &str, sessions: &[&str]) -> Self {
        Self {
            doc_service: Arc::new(MockDocService::new()),
            metadata: Arc::new(MockMetadata::with_sessions(locality, sessions)),
            publisher: Arc::new(RecordingPublisher::new()),
            fetcher: Arc::new(MockFetcher::new()),
            event_bus: Arc::new(EventBus::new(4096)),
        }
    }

    pub fn context(&self, locality: &str) -> ScrapeContext {
        ScrapeContext::new(
            locality,
            Arc::clone(&self.fetcher) as Arc<dyn Fetcher>,
            Arc::clone(&self.doc_service) as Arc<dyn DocServiceClient>,
            Arc::clone(&self.metadata) as Arc<dyn MetadataClient>,
            Arc::clone(&self.publisher) as Arc<dyn Publisher>,
            Arc::clone(&self.event_bus),
        )
    }
}

/// Scripted jurisdiction adapter
///
/// Enumerates fixed ids per session, records the order `scrape_bill` runs,
/// and fails scripted ids with an error chain naming `RuntimeError`.
pub struct TestScraper {
    pub locality: String,
    pub ids_by_session: HashMap<String, Vec<String>>,
    pub failing: HashSet<String>,
    pub expected: Vec<ExpectedError>,
    pub scrape_order: Arc<Mutex<Vec<String>>>,
    /// Whether each scraped id arrived with pre-scraped context
    pub context_seen: Arc<Mutex<HashMap<String, bool>>>,
}

impl TestScraper {
    pub fn new(locality: &str, session: &str, ids: &[&str]) -> Self {
        Self {
            locality: locality.to_string(),
            ids_by_session: HashMap::from([(
                session.to_string(),
                ids.iter().map(|s| s.to_string()).collect(),
            )]),
            failing: HashSet::new(),
            expected: Vec::new(),
            scrape_order: Arc::new(Mutex::new(Vec::new())),
            context_seen: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Make `scrape_bill` fail for this normalized id
    pub fn fail_on(mut self, normalized_id: &str) -> Self {
        self.failing.insert(normalized_id.to_string());
        self
    }

    pub fn expect_error(mut self, session: &str, bill_id: &str, message: &str) -> Self {
        self.expected
            .push(ExpectedError::new(session, bill_id, message));
        self
    }
}

#[async_trait]
impl JurisdictionScraper for TestScraper {
    fn locality(&self) -> &str {
        &self.locality
    }

    async fn enumerate_bill_ids(
        &self,
        _ctx: &ScrapeContext,
        session: &str,
    ) -> anyhow::Result<Enumeration> {
        match self.ids_by_session.get(session) {
            Some(ids) => Ok(Enumeration::Ids(ids.clone())),
            None => anyhow::bail!("no bill list for session {}", session),
        }
    }

    async fn scrape_bill(
        &self,
        ctx: &ScrapeContext,
        session: &str,
        id: &NormalizedBillId,
        bill_ctx: Option<&BillContext>,
    ) -> anyhow::Result<()> {
        self.scrape_order.lock().unwrap().push(id.id.clone());
        self.context_seen
            .lock()
            .unwrap()
            .insert(id.id.clone(), bill_ctx.is_some());

        if self.failing.contains(&id.id) {
            anyhow::bail!("RuntimeError: scripted failure for {}", id.id);
        }

        let mut bill = Bill::new(session, id, format!("An act known as {}", id.id));
        bill.add_source(
            &format!("https://leg.example/{}/{}", session, id.id.replace(' ', "")),
            None,
        );
        ctx.save_bill(bill).await?;
        Ok(())
    }

    fn expected_errors(&self) -> &[ExpectedError] {
        &self.expected
    }
}

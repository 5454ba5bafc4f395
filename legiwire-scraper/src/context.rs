//! Scrape context: the collaborators handed to every adapter
//!
//! One explicit record, constructed by the driver and passed through the
//! adapter's call chain. No ambient lookup: everything an adapter may touch
//! (clients, event bus, registrar options) is a field here.

use std::sync::Arc;

use chrono::Utc;

use crate::clients::{DocServiceClient, Fetcher, MetadataClient, Publisher};
use crate::entities::{CommitteeExtractor, EntityExtractor};
use crate::publish;
use crate::registrar::DocumentRegistrar;
use legiwire_common::events::{EventBus, ScrapeEvent};
use legiwire_common::models::{Bill, Event};
use legiwire_common::report;
use legiwire_common::Result;

/// Options threaded into every registrar the context creates
#[derive(Debug, Clone, Default)]
pub struct RegistrarOptions {
    /// Skip integrity checks on content-addressed upload
    pub s3_skip_checks: bool,
    /// Force re-extraction of documents registered with a matching flag
    pub extraction_flag: Option<String>,
}

/// Shared collaborators for one scrape run
///
/// Clients are `Arc`-shared across workers and must be safe for concurrent
/// use; each worker owns its Bill and tracing span privately.
pub struct ScrapeContext {
    pub locality: String,
    pub fetcher: Arc<dyn Fetcher>,
    pub doc_service: Arc<dyn DocServiceClient>,
    pub metadata: Arc<dyn MetadataClient>,
    pub publisher: Arc<dyn Publisher>,
    pub event_bus: Arc<EventBus>,
    pub registrar_options: RegistrarOptions,
    /// Committee auto-extraction at save time; `None` disables it
    pub entity_extractor: Option<Arc<dyn EntityExtractor>>,
}

impl ScrapeContext {
    pub fn new(
        locality: impl Into<String>,
        fetcher: Arc<dyn Fetcher>,
        doc_service: Arc<dyn DocServiceClient>,
        metadata: Arc<dyn MetadataClient>,
        publisher: Arc<dyn Publisher>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            locality: locality.into(),
            fetcher,
            doc_service,
            metadata,
            publisher,
            event_bus,
            registrar_options: RegistrarOptions::default(),
            entity_extractor: Some(Arc::new(CommitteeExtractor)),
        }
    }

    pub fn with_registrar_options(mut self, options: RegistrarOptions) -> Self {
        self.registrar_options = options;
        self
    }

    pub fn without_entity_extraction(mut self) -> Self {
        self.entity_extractor = None;
        self
    }

    /// A registrar bound to this context's clients and options
    pub fn registrar(&self) -> DocumentRegistrar {
        DocumentRegistrar::new(
            Arc::clone(&self.fetcher),
            Arc::clone(&self.doc_service),
            Arc::clone(&self.event_bus),
            self.registrar_options.clone(),
        )
    }

    /// Validate and publish a finished Bill (consumes it)
    pub async fn save_bill(&self, bill: Bill) -> Result<()> {
        publish::save_bill(self, bill).await
    }

    /// Validate and publish a finished calendar Event (consumes it)
    pub async fn save_event(&self, event: Event) -> Result<()> {
        publish::save_event(self, event).await
    }

    /// Report missing or malformed page data under a named policy
    ///
    /// Logs at the policy's severity and emits an `ExtractionIssue` event;
    /// never raises. Unknown policy names report at warning.
    pub fn report(&self, policy: &str, bill_id: Option<&str>, message: &str) {
        let severity = report::severity_for(policy);
        severity.log(policy, message);
        self.event_bus.emit_lossy(ScrapeEvent::ExtractionIssue {
            policy: policy.to_string(),
            severity,
            bill_id: bill_id.map(|s| s.to_string()),
            message: message.to_string(),
            timestamp: Utc::now(),
        });
    }
}

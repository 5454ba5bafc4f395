//! Scrape run events and the EventBus
//!
//! Every observable outcome of a run is broadcast as a `ScrapeEvent`:
//! per-bill saves and failures, document registrations, extraction issues,
//! and run lifecycle markers. The driver subscribes a logging drain; tests
//! subscribe to assert on outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::report::Severity;

/// Events emitted during a scrape run
///
/// Serialized for downstream observability; every variant carries a
/// timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ScrapeEvent {
    /// A run began dispatching
    RunStarted {
        locality: String,
        sessions: Vec<String>,
        concurrency: usize,
        /// Correlates all per-bill request ids to this run
        process_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// One bill was validated and published
    BillSaved {
        locality: String,
        session: String,
        bill_id: String,
        timestamp: DateTime<Utc>,
    },

    /// One bill failed; siblings continue
    BillFailed {
        locality: String,
        session: String,
        bill_id: String,
        /// Full error chain, outermost first
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// A pre-registered benign failure, downgraded to warning
    ExpectedFailure {
        locality: String,
        session: String,
        bill_id: String,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Missing or malformed data on a page, reported per policy
    ExtractionIssue {
        policy: String,
        severity: Severity,
        bill_id: Option<String>,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// An artifact was registered with the document service
    DocumentRegistered {
        url: String,
        download_id: i64,
        /// True when a prior registration was reused without uploading
        deduplicated: bool,
        timestamp: DateTime<Utc>,
    },

    /// An artifact could not be registered; the bill still publishes
    DocumentFailed {
        url: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// One calendar event was validated and published
    EventSaved {
        locality: String,
        session: String,
        description: String,
        timestamp: DateTime<Utc>,
    },

    /// A run finished (normally or after cancellation)
    RunCompleted {
        locality: String,
        scraped: usize,
        failed: usize,
        expected_failures: usize,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
}

impl ScrapeEvent {
    /// Event type as a string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            ScrapeEvent::RunStarted { .. } => "RunStarted",
            ScrapeEvent::BillSaved { .. } => "BillSaved",
            ScrapeEvent::BillFailed { .. } => "BillFailed",
            ScrapeEvent::ExpectedFailure { .. } => "ExpectedFailure",
            ScrapeEvent::ExtractionIssue { .. } => "ExtractionIssue",
            ScrapeEvent::DocumentRegistered { .. } => "DocumentRegistered",
            ScrapeEvent::DocumentFailed { .. } => "DocumentFailed",
            ScrapeEvent::EventSaved { .. } => "EventSaved",
            ScrapeEvent::RunCompleted { .. } => "RunCompleted",
        }
    }
}

/// Broadcast bus for scrape events
///
/// Shared across workers; emission never blocks scraping. Subscribers that
/// fall behind lose the oldest events (bounded channel).
pub struct EventBus {
    tx: broadcast::Sender<ScrapeEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a bus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<ScrapeEvent> {
        self.tx.subscribe()
    }

    /// Emit an event; errors when no subscriber is listening
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ScrapeEvent,
    ) -> Result<usize, broadcast::error::SendError<ScrapeEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the no-subscriber case
    ///
    /// Scrape progress events are useful but not load-bearing; a run with
    /// no observer attached still completes.
    pub fn emit_lossy(&self, event: ScrapeEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1000)
    }
}

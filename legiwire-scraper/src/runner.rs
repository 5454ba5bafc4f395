//! Scraper runner
//!
//! Orchestrates one run: validate sessions (all-or-nothing), enumerate bill
//! ids per session, normalize and sort them, and dispatch one task per bill
//! with bounded concurrency. Per-bill failures are caught at the worker
//! boundary and reported; only configuration errors abort the run.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::adapter::{BillContext, JurisdictionScraper};
use crate::context::ScrapeContext;
use crate::sessions;
use legiwire_common::bill_id::{self, NormalizedBillId};
use legiwire_common::events::ScrapeEvent;
use legiwire_common::{Error, Result};

/// Caller-supplied options for one run
#[derive(Debug, Clone, Default)]
pub struct RunnerOptions {
    /// Internal session ids to scrape (1+ required)
    pub sessions: Vec<String>,
    /// Explicit bill ids with optional per-bill context; requires exactly
    /// one session for unambiguous routing
    pub bill_ids: Option<HashMap<String, Option<BillContext>>>,
    /// Allowlist intersected with the enumeration; unknown ids are a hard
    /// error
    pub filter_bill_ids: Vec<String>,
    /// Worker count; 1 = strictly sequential
    pub concurrency: usize,
}

/// Outcome counts for a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub scraped: usize,
    pub failed: usize,
    pub expected_failures: usize,
    pub duration_ms: u64,
}

/// The per-jurisdiction concurrency runner
pub struct ScrapeRunner<S: JurisdictionScraper> {
    scraper: Arc<S>,
    ctx: Arc<ScrapeContext>,
    cancel: CancellationToken,
}

impl<S: JurisdictionScraper + 'static> ScrapeRunner<S> {
    pub fn new(scraper: S, ctx: ScrapeContext) -> Self {
        Self {
            scraper: Arc::new(scraper),
            ctx: Arc::new(ctx),
            cancel: CancellationToken::new(),
        }
    }

    /// Token the driver cancels on shutdown signals
    ///
    /// No new tasks start after cancellation; in-flight tasks complete and
    /// are drained.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Execute one run
    ///
    /// Configuration errors (invalid session, flag conflicts, unknown
    /// filter ids) escape immediately; everything else is contained and
    /// counted in the summary.
    pub async fn run(&self, options: RunnerOptions) -> Result<RunSummary> {
        let start = Instant::now();
        let locality = self.scraper.locality().to_string();

        if options.sessions.is_empty() {
            return Err(Error::Config("at least one session is required".into()));
        }
        if options.bill_ids.is_some() && options.sessions.len() > 1 {
            return Err(Error::Config(
                "explicit bill ids require exactly one session".into(),
            ));
        }
        let concurrency = options.concurrency.max(1);

        // All-or-nothing session precheck before any dispatch
        sessions::validate_sessions(
            self.ctx.metadata.as_ref(),
            &locality,
            &options.sessions,
        )
        .await?;

        let process_id = Uuid::new_v4();
        tracing::info!(
            locality = %locality,
            sessions = ?options.sessions,
            concurrency,
            process_id = %process_id,
            "Starting scrape run"
        );
        self.ctx.event_bus.emit_lossy(ScrapeEvent::RunStarted {
            locality: locality.clone(),
            sessions: options.sessions.clone(),
            concurrency,
            process_id,
            timestamp: Utc::now(),
        });

        let scraped = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));
        let expected = Arc::new(AtomicUsize::new(0));

        for session in &options.sessions {
            if self.cancel.is_cancelled() {
                break;
            }

            let bills = self.collect_bills(session, &options, &failed).await?;
            tracing::info!(
                session = %session,
                bill_count = bills.len(),
                "Dispatching bills"
            );

            stream::iter(bills)
                .map(|(id, bill_ctx)| {
                    self.scrape_one(
                        session.clone(),
                        id,
                        bill_ctx,
                        process_id,
                        Arc::clone(&scraped),
                        Arc::clone(&failed),
                        Arc::clone(&expected),
                    )
                })
                .buffer_unordered(concurrency)
                .collect::<Vec<()>>()
                .await;
        }

        let summary = RunSummary {
            scraped: scraped.load(Ordering::Relaxed),
            failed: failed.load(Ordering::Relaxed),
            expected_failures: expected.load(Ordering::Relaxed),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        tracing::info!(
            locality = %locality,
            scraped = summary.scraped,
            failed = summary.failed,
            expected_failures = summary.expected_failures,
            duration_ms = summary.duration_ms,
            cancelled = self.cancel.is_cancelled(),
            "Scrape run completed"
        );
        self.ctx.event_bus.emit_lossy(ScrapeEvent::RunCompleted {
            locality,
            scraped: summary.scraped,
            failed: summary.failed,
            expected_failures: summary.expected_failures,
            duration_ms: summary.duration_ms,
            timestamp: Utc::now(),
        });

        Ok(summary)
    }

    /// Enumerate, normalize, filter, and sort one session's bill ids
    ///
    /// Ids are sorted lexicographically by normalized id before dispatch so
    /// sequential and parallel runs see the same dispatch order. An id that
    /// fails the normalization grammar is reported and skipped; listing
    /// entries that collapse to the same normalized id are reported and
    /// dispatched once. An enumeration failure is a run-level failure and
    /// the session yields no bills; only an allowlisted id missing from the
    /// enumeration is a configuration error.
    async fn collect_bills(
        &self,
        session: &str,
        options: &RunnerOptions,
        failed: &Arc<AtomicUsize>,
    ) -> Result<Vec<(NormalizedBillId, Option<BillContext>)>> {
        let raw: HashMap<String, Option<BillContext>> = match &options.bill_ids {
            Some(explicit) => explicit.clone(),
            None => match self.scraper.enumerate_bill_ids(&self.ctx, session).await {
                Ok(enumeration) => enumeration.into_map(),
                Err(e) => {
                    self.ctx.report(
                        "bill_list",
                        None,
                        &format!("bill enumeration failed for session {}: {:#}", session, e),
                    );
                    failed.fetch_add(1, Ordering::Relaxed);
                    return Ok(Vec::new());
                }
            },
        };

        let mut bills: Vec<(NormalizedBillId, Option<BillContext>)> = Vec::new();
        for (raw_id, bill_ctx) in raw {
            let norm = match bill_id::normalize(&raw_id) {
                Ok(norm) => norm,
                Err(e) => {
                    self.ctx.report("bill_list", Some(&raw_id), &e.to_string());
                    failed.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
            };
            // One Bill per (session, id): listing variants collapse here
            match bills.iter_mut().find(|(id, _)| id.id == norm.id) {
                Some((_, existing_ctx)) => {
                    self.ctx.report(
                        "bill_list",
                        Some(&norm.id),
                        &format!("duplicate listing entry '{}' for {}", raw_id, norm.id),
                    );
                    if existing_ctx.is_none() {
                        *existing_ctx = bill_ctx;
                    }
                }
                None => bills.push((norm, bill_ctx)),
            }
        }

        if !options.filter_bill_ids.is_empty() {
            let mut allowlist = Vec::with_capacity(options.filter_bill_ids.len());
            for raw_id in &options.filter_bill_ids {
                let norm = bill_id::normalize(raw_id)
                    .map_err(|e| Error::Config(format!("invalid filter bill id: {}", e)))?;
                if !bills.iter().any(|(id, _)| id.id == norm.id) {
                    return Err(Error::Config(format!(
                        "filter bill id '{}' not found in session {}",
                        norm.id, session
                    )));
                }
                allowlist.push(norm.id);
            }
            bills.retain(|(id, _)| allowlist.contains(&id.id));
        }

        bills.sort_by(|a, b| a.0.id.cmp(&b.0.id));
        Ok(bills)
    }

    /// One worker task: a fresh span, a private Bill, contained failure
    #[allow(clippy::too_many_arguments)]
    async fn scrape_one(
        &self,
        session: String,
        id: NormalizedBillId,
        bill_ctx: Option<BillContext>,
        process_id: Uuid,
        scraped: Arc<AtomicUsize>,
        failed: Arc<AtomicUsize>,
        expected: Arc<AtomicUsize>,
    ) {
        if self.cancel.is_cancelled() {
            return;
        }

        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "bill",
            request_id = %request_id,
            process_id = %process_id,
            scraper = %self.scraper.locality(),
            session = %session,
            bill_id = %id.id,
        );

        let scraper = Arc::clone(&self.scraper);
        let ctx = Arc::clone(&self.ctx);
        let result = async {
            scraper
                .scrape_bill(&ctx, &session, &id, bill_ctx.as_ref())
                .await
        }
        .instrument(span)
        .await;

        match result {
            Ok(()) => {
                scraped.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                // Alternate formatting renders the full error chain
                let chain = format!("{:#}", e);
                let known = self
                    .scraper
                    .expected_errors()
                    .iter()
                    .any(|entry| entry.matches(&session, &id.id, &chain));
                if known {
                    tracing::warn!(
                        bill_id = %id.id,
                        session = %session,
                        error = %chain,
                        "Expected failure; continuing"
                    );
                    expected.fetch_add(1, Ordering::Relaxed);
                    self.ctx.event_bus.emit_lossy(ScrapeEvent::ExpectedFailure {
                        locality: self.scraper.locality().to_string(),
                        session,
                        bill_id: id.id,
                        message: chain,
                        timestamp: Utc::now(),
                    });
                } else {
                    tracing::error!(
                        bill_id = %id.id,
                        session = %session,
                        error = %chain,
                        "Bill scrape failed; siblings continue"
                    );
                    failed.fetch_add(1, Ordering::Relaxed);
                    self.ctx.event_bus.emit_lossy(ScrapeEvent::BillFailed {
                        locality: self.scraper.locality().to_string(),
                        session,
                        bill_id: id.id,
                        error: chain,
                        timestamp: Utc::now(),
                    });
                }
            }
        }
    }
}

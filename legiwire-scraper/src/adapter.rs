//! Jurisdiction adapter contract
//!
//! Site-specific extraction lives outside the framework. An adapter
//! enumerates bill ids for a session and scrapes one bill at a time; the
//! runner owns normalization, ordering, concurrency, and failure isolation.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::context::ScrapeContext;
use legiwire_common::bill_id::NormalizedBillId;

/// Per-bill context an enumeration may pre-scrape
///
/// Typically a URL, title, or year captured from the listing page to save a
/// round trip. Opaque to the framework.
pub type BillContext = serde_json::Value;

/// Result of enumerating a session's bill ids
#[derive(Debug, Clone)]
pub enum Enumeration {
    /// Bare identifiers
    Ids(Vec<String>),
    /// Identifiers with pre-scraped per-bill context
    WithContext(HashMap<String, BillContext>),
}

impl Enumeration {
    /// Flatten both shapes into id -> optional context
    pub fn into_map(self) -> HashMap<String, Option<BillContext>> {
        match self {
            Enumeration::Ids(ids) => ids.into_iter().map(|id| (id, None)).collect(),
            Enumeration::WithContext(map) => {
                map.into_iter().map(|(id, ctx)| (id, Some(ctx))).collect()
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Enumeration::Ids(ids) => ids.len(),
            Enumeration::WithContext(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A pre-declared, benign scraping failure for a known bad record
///
/// When `scrape_bill` fails for `(session, bill_id)` and the error text
/// contains `message`, the failure is downgraded from fatal to warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedError {
    pub session: String,
    pub bill_id: String,
    pub message: String,
}

impl ExpectedError {
    pub fn new(
        session: impl Into<String>,
        bill_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            session: session.into(),
            bill_id: bill_id.into(),
            message: message.into(),
        }
    }

    /// Match a failure against this entry
    pub fn matches(&self, session: &str, bill_id: &str, error: &str) -> bool {
        self.session == session && self.bill_id == bill_id && error.contains(&self.message)
    }
}

/// The capability set every jurisdiction scraper implements
///
/// Implementations receive the framework-provided [`ScrapeContext`] and emit
/// normalized objects through it; they never publish directly.
#[async_trait]
pub trait JurisdictionScraper: Send + Sync {
    /// Jurisdiction code (`ak`, `az`, ..., `eu`)
    fn locality(&self) -> &str;

    /// Enumerate bill identifiers for one session
    async fn enumerate_bill_ids(
        &self,
        ctx: &ScrapeContext,
        session: &str,
    ) -> anyhow::Result<Enumeration>;

    /// Populate and save one Bill through `ctx.save_bill`
    async fn scrape_bill(
        &self,
        ctx: &ScrapeContext,
        session: &str,
        id: &NormalizedBillId,
        bill_ctx: Option<&BillContext>,
    ) -> anyhow::Result<()>;

    /// Known-benign failures to downgrade; empty by default
    fn expected_errors(&self) -> &[ExpectedError] {
        &[]
    }
}

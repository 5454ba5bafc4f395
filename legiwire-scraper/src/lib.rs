//! Scraper execution framework for the legiwire fleet
//!
//! Unifies the per-jurisdiction scrapers: the concurrency runner, the
//! document-service registrar, session validation, and the publishing
//! façade. Site-specific extraction lives in jurisdiction crates that
//! implement [`adapter::JurisdictionScraper`] and drive a run through
//! [`cli::run`] or [`runner::ScrapeRunner`] directly.

pub mod adapter;
pub mod cli;
pub mod clients;
pub mod context;
pub mod entities;
pub mod publish;
pub mod registrar;
pub mod runner;
pub mod sessions;

pub use adapter::{BillContext, Enumeration, ExpectedError, JurisdictionScraper};
pub use context::{RegistrarOptions, ScrapeContext};
pub use registrar::{DocumentRegistrar, DownloadResult, ExtractionType, RegistrationRequest};
pub use runner::{RunSummary, RunnerOptions, ScrapeRunner};

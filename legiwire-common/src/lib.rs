//! Shared library for the legiwire scraper fleet
//!
//! Provides the normalized legislative data model (Bill, Vote, Document,
//! Event), the bill-id normalization grammar, the reporting-policy table,
//! event types + EventBus, wire-format serialization, URL percent-encoding,
//! and configuration loading shared by every jurisdiction scraper.

pub mod bill_id;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod report;
pub mod urlenc;
pub mod wire;

pub use error::{Error, Result};

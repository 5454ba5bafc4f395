//! Roll-call votes

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Chamber;
use crate::wire;

/// One recorded vote on a motion
///
/// The counts are authoritative; the per-name lists are best-effort and may
/// be empty when the source only publishes tallies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Vote {
    pub chamber: Chamber,
    #[serde(with = "wire::wire_date")]
    #[schemars(with = "String")]
    pub date: NaiveDate,
    pub motion: String,
    pub passed: bool,
    pub yes_count: u32,
    pub no_count: u32,
    pub other_count: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub yes_votes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub no_votes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub other_votes: Vec<String>,
}

impl Vote {
    pub fn new(
        chamber: Chamber,
        date: NaiveDate,
        motion: impl Into<String>,
        passed: bool,
        yes_count: u32,
        no_count: u32,
        other_count: u32,
    ) -> Self {
        Self {
            chamber,
            date,
            motion: motion.into(),
            passed,
            yes_count,
            no_count,
            other_count,
            yes_votes: Vec::new(),
            no_votes: Vec::new(),
            other_votes: Vec::new(),
        }
    }

    pub fn record_yes(&mut self, name: impl Into<String>) {
        self.yes_votes.push(name.into());
    }

    pub fn record_no(&mut self, name: impl Into<String>) {
        self.no_votes.push(name.into());
    }

    pub fn record_other(&mut self, name: impl Into<String>) {
        self.other_votes.push(name.into());
    }
}

//! Entity auto-extraction from action text
//!
//! At save time every action's free text is scanned for committee
//! references, which become `related_entities` of type `committee`. The
//! extractor is a pluggable seam so jurisdictions with unusual naming can
//! substitute their own, or the driver can disable it.

use once_cell::sync::Lazy;
use regex::Regex;

/// Pluggable entity-extraction seam
pub trait EntityExtractor: Send + Sync {
    /// Committee names referenced in `text`, in order of appearance
    fn extract_committees(&self, text: &str) -> Vec<String>;
}

/// Default committee extractor
///
/// Matches the two shapes U.S. legislature journals use: "Committee on
/// Finance" and "House Judiciary Committee".
pub struct CommitteeExtractor;

static COMMITTEE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"Committee on [A-Z][A-Za-z]+(?: (?:and |of |& )?[A-Z][A-Za-z]+)*|[A-Z][A-Za-z]+(?: [A-Z][A-Za-z]+)* Committee",
    )
    .expect("committee regex is valid")
});

impl EntityExtractor for CommitteeExtractor {
    fn extract_committees(&self, text: &str) -> Vec<String> {
        let mut found = Vec::new();
        for m in COMMITTEE_RE.find_iter(text) {
            let name = m.as_str().trim_end_matches([' ', ',']).to_string();
            if !found.contains(&name) {
                found.push(name);
            }
        }
        found
    }
}

//! Bill identifier normalization
//!
//! Canonicalizes externally observed bill ids into `"<TYPE> <NUM>"` form and
//! classifies the originating chamber and bill type from the letter prefix.
//! Source sites render the same bill as `HB1`, `H.B. 001`, or `hb 1`; all of
//! those normalize to `HB 1`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{BillType, Chamber};

/// Bill-id normalization errors
///
/// Any failure is a hard error for that single bill-id; the caller reports
/// it and moves on to the next id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillIdError {
    #[error("bill id '{0}' does not contain exactly 2 parts")]
    PartCount(String),

    #[error("bill id '{0}' does not have a valid prefix")]
    InvalidPrefix(String),

    #[error("bill id '{0}' does not have a valid number")]
    InvalidNumber(String),

    #[error("bill id '{0}' does not have a valid type split")]
    InvalidTypeSplit(String),

    #[error("bill id '{0}' has unknown doc type '{1}'")]
    UnknownDocType(String, String),
}

/// A canonicalized bill identifier
///
/// `id` is the canonical `"<TYPE> <NUM>"` string. `chamber` is derived from
/// the first prefix letter and may be unresolved for unusual prefixes.
/// Ordering is lexicographic by `id`, which is the dispatch order used by
/// the runner.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NormalizedBillId {
    /// Canonical `"<TYPE> <NUM>"` form
    pub id: String,
    /// Originating chamber, when the prefix letter resolves one
    pub chamber: Option<Chamber>,
    /// Bill type from the doc-type letters of the prefix
    pub bill_type: BillType,
}

impl std::fmt::Display for NormalizedBillId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}

/// Normalize a free-form bill identifier
///
/// **Rewrites, applied in order:**
/// 1. If no whitespace separates the letter prefix from the first digit,
///    insert a space at the first digit boundary.
/// 2. Uppercase, split on whitespace, require exactly two tokens.
/// 3. Strip periods from the prefix; it must then match `[A-Z]+`.
/// 4. Strip leading zeros from the numeric token; it must then match
///    `[0-9A-Z]+` or, for dashed identifiers, `[-0-9A-Z]{3,}`.
///
/// Normalization is idempotent: `normalize(normalize(x)) == normalize(x)`
/// for every accepted input.
pub fn normalize(raw: &str) -> Result<NormalizedBillId, BillIdError> {
    let trimmed = raw.trim();

    // Rewrite 1: "HB1" -> "HB 1"
    let spaced = if trimmed.contains(char::is_whitespace) {
        trimmed.to_string()
    } else {
        match trimmed.find(|c: char| c.is_ascii_digit()) {
            Some(pos) if pos > 0 => format!("{} {}", &trimmed[..pos], &trimmed[pos..]),
            _ => trimmed.to_string(),
        }
    };

    // Rewrite 2: uppercase and require exactly two tokens
    let upper = spaced.to_uppercase();
    let parts: Vec<&str> = upper.split_whitespace().collect();
    if parts.len() != 2 {
        return Err(BillIdError::PartCount(raw.to_string()));
    }

    // Rewrite 3: strip periods from the prefix
    let prefix: String = parts[0].chars().filter(|&c| c != '.').collect();
    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(BillIdError::InvalidPrefix(raw.to_string()));
    }

    // Rewrite 4: strip leading zeros from the number
    let number = parts[1].trim_start_matches('0');
    if !valid_number(number) {
        return Err(BillIdError::InvalidNumber(raw.to_string()));
    }

    let chamber = chamber_for_prefix(&prefix);
    let bill_type = bill_type_for_prefix(raw, &prefix)?;

    Ok(NormalizedBillId {
        id: format!("{} {}", prefix, number),
        chamber,
        bill_type,
    })
}

/// `[0-9A-Z]+`, or `[-0-9A-Z]{3,}` for dashed identifiers
fn valid_number(number: &str) -> bool {
    if number.is_empty() {
        return false;
    }
    let plain = number
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase());
    if plain {
        return true;
    }
    number.len() >= 3
        && number
            .chars()
            .all(|c| c == '-' || c.is_ascii_digit() || c.is_ascii_uppercase())
}

/// Chamber by the first letter of the prefix
///
/// `H/A/C/I` are house-equivalents, `S/J` senate-equivalents; any other
/// letter is unresolved and left to the adapter.
fn chamber_for_prefix(prefix: &str) -> Option<Chamber> {
    match prefix.chars().next() {
        Some('H') | Some('A') | Some('C') | Some('I') => Some(Chamber::Lower),
        Some('S') | Some('J') => Some(Chamber::Upper),
        _ => None,
    }
}

/// Bill type by the letters after the first (the "doc type")
fn bill_type_for_prefix(raw: &str, prefix: &str) -> Result<BillType, BillIdError> {
    let doc_type = &prefix[1..];
    if doc_type.is_empty() {
        return Err(BillIdError::InvalidTypeSplit(raw.to_string()));
    }
    match doc_type {
        "B" => Ok(BillType::Bill),
        "R" => Ok(BillType::Resolution),
        "JR" => Ok(BillType::JointResolution),
        "CR" => Ok(BillType::ConcurrentResolution),
        "CA" => Ok(BillType::ConstitutionalAmendment),
        "M" => Ok(BillType::Memorial),
        "JM" => Ok(BillType::JointMemorial),
        other => Err(BillIdError::UnknownDocType(
            raw.to_string(),
            other.to_string(),
        )),
    }
}

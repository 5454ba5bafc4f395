//! Reporting policies for extraction failures
//!
//! Every extraction call an adapter makes carries a policy name; when the
//! extraction comes back missing or empty, the framework logs at the
//! policy's severity instead of raising. `critical` policies escalate to
//! run-level failure events; `warning` and below are observability only.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Report severity, lowest to highest
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Ok,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Ok => "ok",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

impl Severity {
    /// True when this severity escalates to a run-level failure event
    pub fn is_critical(&self) -> bool {
        matches!(self, Severity::Critical)
    }

    /// Log `message` at the tracing level matching this severity
    pub fn log(&self, policy: &str, message: &str) {
        match self {
            Severity::Debug => tracing::debug!(policy = policy, "{}", message),
            Severity::Info | Severity::Ok => tracing::info!(policy = policy, "{}", message),
            Severity::Warning => tracing::warn!(policy = policy, "{}", message),
            Severity::Critical => tracing::error!(policy = policy, "{}", message),
        }
    }
}

/// A named reporting policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    pub name: &'static str,
    pub severity: Severity,
}

/// The fixed policy table
///
/// Names cover every field that might be absent or malformed on a source
/// page. Missing the whole bill list or the bill page itself is critical;
/// individual sub-sequences degrade to warning or info.
static POLICIES: Lazy<HashMap<&'static str, Severity>> = Lazy::new(|| {
    HashMap::from([
        ("bill_list", Severity::Critical),
        ("bill", Severity::Critical),
        ("bill_title", Severity::Critical),
        ("bill_documents", Severity::Warning),
        ("bill_versions", Severity::Warning),
        ("bill_votes", Severity::Warning),
        ("bill_sponsors", Severity::Warning),
        ("bill_actions", Severity::Warning),
        ("bill_summary", Severity::Info),
        ("bill_partial_documents", Severity::Info),
        ("bill_companions", Severity::Info),
        ("bill_subjects", Severity::Info),
        ("legislators", Severity::Warning),
        ("json", Severity::Critical),
        ("doc_service", Severity::Critical),
        ("wrong_session", Severity::Critical),
    ])
});

/// Look up a policy by name
pub fn lookup(name: &str) -> Option<Policy> {
    POLICIES.get_key_value(name).map(|(k, v)| Policy {
        name: k,
        severity: *v,
    })
}

/// Severity for a policy name, defaulting unknown names to warning
///
/// Adapters occasionally invent one-off labels; those report at warning
/// rather than being dropped.
pub fn severity_for(name: &str) -> Severity {
    POLICIES.get(name).copied().unwrap_or(Severity::Warning)
}

//! The Bill entity and its append-only mutation operations

use std::collections::HashMap;

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{DocumentServiceDocument, Vote};
use crate::bill_id::{self, NormalizedBillId};
use crate::urlenc;
use crate::{Error, Result};

/// Legislative chamber
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Chamber {
    Upper,
    Lower,
    Joint,
    Executive,
    Other,
}

impl std::fmt::Display for Chamber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Chamber::Upper => "upper",
            Chamber::Lower => "lower",
            Chamber::Joint => "joint",
            Chamber::Executive => "executive",
            Chamber::Other => "other",
        };
        f.write_str(s)
    }
}

/// Bill classification derived from the id prefix
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum BillType {
    Bill,
    Resolution,
    JointResolution,
    ConcurrentResolution,
    ConstitutionalAmendment,
    Memorial,
    JointMemorial,
}

/// A source page the scraper read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Source {
    pub url: String,
    pub source_type: String,
}

/// A bill sponsor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Sponsor {
    pub name: String,
    /// e.g. "primary", "cosponsor"
    pub classification: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chamber: Option<Chamber>,
}

/// An entity referenced from an action's free text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RelatedEntity {
    pub name: String,
    /// e.g. "committee"
    pub entity_type: String,
}

/// One step in a bill's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Action {
    pub actor: Chamber,
    pub action: String,
    #[serde(with = "crate::wire::wire_date")]
    #[schemars(with = "String")]
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_entities: Vec<RelatedEntity>,
}

/// A companion or otherwise related bill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RelatedBill {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    /// e.g. "companion", "prior_session"
    pub relation_type: String,
}

/// The central record produced by a scraper
///
/// Created once per `(session, id)` during a run, mutated only through the
/// named append methods below, and published at most once (publication
/// consumes the value, so a published Bill cannot be mutated).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Bill {
    /// Jurisdiction code; stamped by the publishing façade at save time
    #[serde(default)]
    pub locality: String,
    pub session: String,
    pub chamber: Chamber,
    /// Normalized `"<TYPE> <NUM>"` bill id
    pub id: String,
    pub title: String,
    pub bill_type: BillType,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub sponsors: Vec<Sponsor>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub votes: Vec<Vote>,
    /// Ordered; indices are the stable references used by `children[]`
    #[serde(default)]
    pub documents: Vec<DocumentServiceDocument>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub alternate_titles: Vec<String>,
    #[serde(default)]
    pub alternate_ids: Vec<String>,
    #[serde(default)]
    pub related_bills: Vec<RelatedBill>,
    #[serde(default)]
    pub external_resources: Vec<Source>,
    /// Child index -> owning parent index; first writer wins
    #[serde(skip)]
    child_assignments: HashMap<usize, usize>,
}

impl Bill {
    /// Create a Bill for one `(session, id)` pair
    ///
    /// Chamber and bill type come from the normalized id; an unresolved
    /// chamber defaults to `other` and may be overridden with
    /// [`Bill::set_chamber`].
    pub fn new(
        session: impl Into<String>,
        id: &NormalizedBillId,
        title: impl Into<String>,
    ) -> Self {
        Self {
            locality: String::new(),
            session: session.into(),
            chamber: id.chamber.unwrap_or(Chamber::Other),
            id: id.id.clone(),
            title: title.into(),
            bill_type: id.bill_type,
            sources: Vec::new(),
            sponsors: Vec::new(),
            actions: Vec::new(),
            votes: Vec::new(),
            documents: Vec::new(),
            subjects: Vec::new(),
            alternate_titles: Vec::new(),
            alternate_ids: Vec::new(),
            related_bills: Vec::new(),
            external_resources: Vec::new(),
            child_assignments: HashMap::new(),
        }
    }

    /// Override the chamber when the prefix letter was ambiguous
    pub fn set_chamber(&mut self, chamber: Chamber) {
        self.chamber = chamber;
    }

    /// Append a source page; `source_type` defaults to `"default"`
    ///
    /// The URL is percent-encoded with the fixed reserved set before
    /// storage.
    pub fn add_source(&mut self, url: &str, source_type: Option<&str>) {
        self.sources.push(Source {
            url: urlenc::encode_url(url),
            source_type: source_type.unwrap_or("default").to_string(),
        });
    }

    pub fn add_sponsor(&mut self, sponsor: Sponsor) {
        self.sponsors.push(sponsor);
    }

    pub fn add_action(&mut self, actor: Chamber, action: impl Into<String>, date: NaiveDate) {
        self.actions.push(Action {
            actor,
            action: action.into(),
            date,
            related_entities: Vec::new(),
        });
    }

    pub fn add_vote(&mut self, vote: Vote) {
        self.votes.push(vote);
    }

    pub fn add_subject(&mut self, subject: impl Into<String>) {
        self.subjects.push(subject.into());
    }

    pub fn add_alternate_title(&mut self, title: impl Into<String>) {
        self.alternate_titles.push(title.into());
    }

    pub fn add_alternate_id(&mut self, id: impl Into<String>) {
        self.alternate_ids.push(id.into());
    }

    pub fn add_related_bill(&mut self, related: RelatedBill) {
        self.related_bills.push(related);
    }

    pub fn add_external_resource(&mut self, url: &str, source_type: Option<&str>) {
        self.external_resources.push(Source {
            url: urlenc::encode_url(url),
            source_type: source_type.unwrap_or("default").to_string(),
        });
    }

    /// Append a registered document, deduplicating by artifact identity
    ///
    /// No two `complete` entries may share a `(download_id, document_id)`
    /// pair and no two `partial` entries may share a `download_id`. When the
    /// incoming document matches an existing entry, the existing index is
    /// returned and nothing is appended.
    pub fn add_doc_service_document(&mut self, doc: DocumentServiceDocument) -> usize {
        if let Some(existing) = self.documents.iter().position(|d| d.same_artifact(&doc)) {
            tracing::debug!(
                bill_id = %self.id,
                download_id = doc.download_id(),
                index = existing,
                "Duplicate document registration; reusing existing entry"
            );
            return existing;
        }
        self.documents.push(doc);
        self.documents.len() - 1
    }

    /// Attach `child_index` as a child of `parent_index`
    ///
    /// Both indices must already refer to entries in `documents[]`. A child
    /// belongs to at most one parent across the Bill: the first assignment
    /// wins, and a reassignment attempt warns and leaves both documents
    /// unchanged. Returns true when the link was recorded.
    pub fn attach_child(&mut self, parent_index: usize, child_index: usize) -> Result<bool> {
        let len = self.documents.len();
        if parent_index >= len || child_index >= len {
            return Err(Error::Validation(format!(
                "child linkage out of range on {}: parent {} child {} of {} documents",
                self.id, parent_index, child_index, len
            )));
        }
        if parent_index == child_index {
            return Err(Error::Validation(format!(
                "document {} of {} cannot be its own child",
                parent_index, self.id
            )));
        }
        if let Some(&owner) = self.child_assignments.get(&child_index) {
            tracing::warn!(
                bill_id = %self.id,
                child = child_index,
                owner = owner,
                attempted = parent_index,
                "Child document already assigned; keeping first parent"
            );
            return Ok(false);
        }
        self.child_assignments.insert(child_index, parent_index);
        self.documents[parent_index].children.push(child_index);
        Ok(true)
    }

    /// Record an alternate rendering for the document at `index`
    pub fn add_alternate_representation(&mut self, index: usize, download_id: i64) -> Result<()> {
        let doc = self.documents.get_mut(index).ok_or_else(|| {
            Error::Validation(format!(
                "no document at index {} on {} for alternate representation",
                index, self.id
            ))
        })?;
        doc.add_alternate_representation(download_id);
        Ok(())
    }

    /// Publish-time validation against the wire contract
    ///
    /// Checks the invariants that cannot be carried by the type system:
    /// non-empty locality/session/title, a canonical id, the document dedup
    /// invariant, and a consistent child topology. Child topology is
    /// recomputed from `documents[]` so a deserialized Bill validates the
    /// same way as a freshly built one.
    pub fn validate(&self) -> Result<()> {
        if self.locality.is_empty() {
            return Err(Error::Validation(format!("bill {} has no locality", self.id)));
        }
        if self.session.is_empty() {
            return Err(Error::Validation(format!("bill {} has no session", self.id)));
        }
        if self.title.trim().is_empty() {
            return Err(Error::Validation(format!("bill {} has an empty title", self.id)));
        }

        match bill_id::normalize(&self.id) {
            Ok(norm) if norm.id == self.id => {}
            Ok(norm) => {
                return Err(Error::Validation(format!(
                    "bill id '{}' is not canonical (expected '{}')",
                    self.id, norm.id
                )))
            }
            Err(e) => return Err(Error::Validation(format!("bill id rejected: {}", e))),
        }

        for (i, doc) in self.documents.iter().enumerate() {
            if self.documents[..i].iter().any(|d| d.same_artifact(doc)) {
                return Err(Error::Validation(format!(
                    "duplicate document registration on {} at index {}",
                    self.id, i
                )));
            }
        }

        let mut owners: HashMap<usize, usize> = HashMap::new();
        for (parent, doc) in self.documents.iter().enumerate() {
            for &child in &doc.children {
                if child >= self.documents.len() {
                    return Err(Error::Validation(format!(
                        "document {} of {} references child {} out of range",
                        parent,
                        self.id,
                        child
                    )));
                }
                if let Some(prior) = owners.insert(child, parent) {
                    return Err(Error::Validation(format!(
                        "child {} of {} claimed by documents {} and {}",
                        child, self.id, prior, parent
                    )));
                }
            }
        }

        Ok(())
    }

    /// JSON Schema for the published Bill record
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Bill)
    }
}

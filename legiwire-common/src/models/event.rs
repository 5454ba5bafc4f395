//! Legislative-calendar events

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Chamber, Source};
use crate::urlenc;
use crate::{Error, Result};

/// Calendar event classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    CommitteeMarkup,
    CommitteeHearing,
    BillSigning,
    Reading,
    FloorDebate,
    Other,
}

/// A participant in a calendar event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Participant {
    pub name: String,
    /// e.g. "committee", "legislator"
    pub participant_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chamber: Option<Chamber>,
}

/// One calendar entry
///
/// Events are keyed by `(date, location)` so duplicates from the same
/// committee calendar collapse; bill references and participants accumulate
/// across duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Event {
    #[serde(with = "crate::wire::wire_datetime")]
    #[schemars(with = "String")]
    pub date: DateTime<Utc>,
    pub description: String,
    pub location: String,
    pub event_type: EventType,
    /// False when the source published a date with no wall-clock time
    pub start_has_time: bool,
    pub session: String,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub related_bills: Vec<String>,
}

impl Event {
    pub fn new(
        date: DateTime<Utc>,
        description: impl Into<String>,
        location: impl Into<String>,
        event_type: EventType,
        start_has_time: bool,
        session: impl Into<String>,
    ) -> Self {
        Self {
            date,
            description: description.into(),
            location: location.into(),
            event_type,
            start_has_time,
            session: session.into(),
            sources: Vec::new(),
            participants: Vec::new(),
            related_bills: Vec::new(),
        }
    }

    pub fn add_source(&mut self, url: &str, source_type: Option<&str>) {
        self.sources.push(Source {
            url: urlenc::encode_url(url),
            source_type: source_type.unwrap_or("default").to_string(),
        });
    }

    pub fn add_participant(&mut self, participant: Participant) {
        if !self.participants.contains(&participant) {
            self.participants.push(participant);
        }
    }

    pub fn add_related_bill(&mut self, bill_id: impl Into<String>) {
        let bill_id = bill_id.into();
        if !self.related_bills.contains(&bill_id) {
            self.related_bills.push(bill_id);
        }
    }

    /// Publish-time validation for the `"events"` topic
    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(Error::Validation("event has an empty description".into()));
        }
        if self.location.trim().is_empty() {
            return Err(Error::Validation(format!(
                "event '{}' has an empty location",
                self.description
            )));
        }
        if self.session.is_empty() {
            return Err(Error::Validation(format!(
                "event '{}' has no session",
                self.description
            )));
        }
        Ok(())
    }

    /// JSON Schema for the published Event record
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Event)
    }
}

/// Collector that collapses duplicate calendar entries
///
/// Committee calendars routinely repeat the same meeting once per agenda
/// item; inserting each repetition here merges sources, participants, and
/// bill references into a single event per `(date, location)`.
#[derive(Debug, Default)]
pub struct EventSet {
    events: Vec<Event>,
    index: HashMap<(DateTime<Utc>, String), usize>,
}

impl EventSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an event, merging into an existing `(date, location)` entry
    ///
    /// Returns the index of the stored event.
    pub fn insert(&mut self, event: Event) -> usize {
        let key = (event.date, event.location.clone());
        match self.index.get(&key) {
            Some(&i) => {
                let existing = &mut self.events[i];
                for source in event.sources {
                    if !existing.sources.contains(&source) {
                        existing.sources.push(source);
                    }
                }
                for participant in event.participants {
                    existing.add_participant(participant);
                }
                for bill in event.related_bills {
                    existing.add_related_bill(bill);
                }
                tracing::debug!(
                    location = %existing.location,
                    date = %existing.date,
                    "Merged duplicate calendar entry"
                );
                i
            }
            None => {
                self.events.push(event);
                let i = self.events.len() - 1;
                self.index.insert(key, i);
                i
            }
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

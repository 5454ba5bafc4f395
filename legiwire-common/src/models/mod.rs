//! Normalized legislative data model
//!
//! Entities are constructed by jurisdiction adapters, mutated only through
//! named append methods, validated once at publication time against the wire
//! schema, and never mutated after publication (publication consumes the
//! value).

mod bill;
mod document;
mod event;
mod vote;

pub use bill::{
    Action, Bill, BillType, Chamber, RelatedBill, RelatedEntity, Source, Sponsor,
};
pub use document::{DocServiceLink, DocumentServiceDocument, DocumentType};
pub use event::{Event, EventSet, EventType, Participant};
pub use vote::Vote;

//! Publishing façade
//!
//! The save path for finished entities: stamp the locality, run the
//! committee auto-extractor over action text, warn on non-standard Unicode
//! spaces, validate against the wire schema, and publish one JSON record to
//! the bus. Validation failure logs critical and the record is not
//! published.

use chrono::Utc;

use crate::context::ScrapeContext;
use legiwire_common::events::ScrapeEvent;
use legiwire_common::models::{Bill, Event, RelatedEntity};
use legiwire_common::{Error, Result};

/// Validate and publish one Bill under the `"bills"` topic
pub async fn save_bill(ctx: &ScrapeContext, mut bill: Bill) -> Result<()> {
    bill.locality = ctx.locality.clone();

    if let Some(extractor) = &ctx.entity_extractor {
        for action in &mut bill.actions {
            for name in extractor.extract_committees(&action.action) {
                let entity = RelatedEntity {
                    name,
                    entity_type: "committee".to_string(),
                };
                if !action.related_entities.contains(&entity) {
                    action.related_entities.push(entity);
                }
            }
        }
    }

    for action in &bill.actions {
        if contains_nonstandard_space(&action.action) {
            tracing::warn!(
                bill_id = %bill.id,
                action = %action.action,
                "Action text contains a non-standard Unicode space"
            );
        }
    }

    if let Err(e) = bill.validate() {
        tracing::error!(bill_id = %bill.id, error = %e, "Bill failed schema validation; not published");
        return Err(e);
    }

    let payload = serde_json::to_value(&bill)?;
    ctx.publisher
        .publish_json_item(&ctx.locality, "bills", &ctx.locality, &payload)
        .await
        .map_err(|e| Error::Internal(format!("publish failed for {}: {}", bill.id, e)))?;

    tracing::info!(
        locality = %ctx.locality,
        session = %bill.session,
        bill_id = %bill.id,
        "Bill published"
    );
    ctx.event_bus.emit_lossy(ScrapeEvent::BillSaved {
        locality: ctx.locality.clone(),
        session: bill.session.clone(),
        bill_id: bill.id.clone(),
        timestamp: Utc::now(),
    });

    Ok(())
}

/// Validate and publish one calendar Event under the `"events"` topic
///
/// `(date, location)` dedup happens in the adapter's `EventSet` before the
/// events reach this point.
pub async fn save_event(ctx: &ScrapeContext, event: Event) -> Result<()> {
    if let Err(e) = event.validate() {
        tracing::error!(error = %e, "Event failed validation; not published");
        return Err(e);
    }

    let payload = serde_json::to_value(&event)?;
    ctx.publisher
        .publish_json_item(&ctx.locality, "events", &ctx.locality, &payload)
        .await
        .map_err(|e| Error::Internal(format!("event publish failed: {}", e)))?;

    tracing::info!(
        locality = %ctx.locality,
        session = %event.session,
        description = %event.description,
        "Event published"
    );
    ctx.event_bus.emit_lossy(ScrapeEvent::EventSaved {
        locality: ctx.locality.clone(),
        session: event.session.clone(),
        description: event.description.clone(),
        timestamp: Utc::now(),
    });

    Ok(())
}

/// True when `text` contains a whitespace character other than the
/// standard space/tab/newline set
fn contains_nonstandard_space(text: &str) -> bool {
    text.chars()
        .any(|c| c.is_whitespace() && !matches!(c, ' ' | '\t' | '\n' | '\r'))
}

//! Session precheck against the metadata service
//!
//! Every requested session id must be known before any worker dispatches
//! (all-or-nothing). An unknown id fails with `InvalidSession` carrying the
//! current-and-future session ids as suggestions.

use chrono::Utc;

use crate::clients::{MetadataClient, SessionRecord};
use legiwire_common::{Error, Result};

/// Validate every requested session id
///
/// Returns the resolved session records in request order. The first unknown
/// id aborts with `Error::InvalidSession`; metadata transport failures abort
/// with `Error::Config` since the run cannot be validated.
pub async fn validate_sessions(
    metadata: &dyn MetadataClient,
    locality: &str,
    sessions: &[String],
) -> Result<Vec<SessionRecord>> {
    let mut records = Vec::with_capacity(sessions.len());

    for requested in sessions {
        let found = metadata
            .get_session(locality, requested)
            .await
            .map_err(|e| Error::Config(format!("session lookup failed: {}", e)))?;

        match found {
            Some(record) => {
                tracing::debug!(
                    locality = locality,
                    session = %requested,
                    name = %record.name,
                    "Session validated"
                );
                records.push(record);
            }
            None => {
                let suggestions = metadata
                    .find_current_and_future_sessions(locality, Utc::now().date_naive())
                    .await
                    .map(|sessions| sessions.into_iter().map(|s| s.id).collect())
                    .unwrap_or_default();
                tracing::error!(
                    locality = locality,
                    session = %requested,
                    suggestions = ?suggestions,
                    "Requested session is unknown to the metadata service"
                );
                return Err(Error::InvalidSession {
                    locality: locality.to_string(),
                    requested: requested.clone(),
                    suggestions,
                });
            }
        }
    }

    Ok(records)
}

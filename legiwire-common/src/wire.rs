//! Wire-format serialization for published records
//!
//! The date/datetime rendering rule is part of the downstream wire contract
//! and is fixed: `DateTime<Utc>` renders as ISO-8601 with a `Z` suffix, and
//! date-only values render as an ISO-8601 date-time at midnight with `Z`.
//! Deserialization accepts both renderings plus a bare `YYYY-MM-DD` date.

use chrono::{DateTime, NaiveDate, Utc};

/// Render a datetime as ISO-8601 with explicit `Z`
pub fn datetime_to_wire(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Render a date as an ISO-8601 date-time at midnight with explicit `Z`
pub fn date_to_wire(date: &NaiveDate) -> String {
    format!("{}T00:00:00Z", date.format("%Y-%m-%d"))
}

/// Serde adapter for `NaiveDate` fields on wire records
pub mod wire_date {
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date_to_wire(date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_wire_date(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for `DateTime<Utc>` fields on wire records
pub mod wire_datetime {
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        dt: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&datetime_to_wire(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_wire_datetime(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse a wire date, accepting midnight-Z and bare date renderings
pub fn parse_wire_date(s: &str) -> Result<NaiveDate, String> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    parse_wire_datetime(s).map(|dt| dt.date_naive())
}

/// Parse a wire datetime (RFC 3339 with `Z` or numeric offset)
pub fn parse_wire_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid wire datetime '{}': {}", s, e))
}

//! Timestamp utilities
//!
//! Timestamps are persisted as RFC 3339 text with a fixed microsecond
//! precision and a `Z` suffix, so lexical order in SQL equals time order.

use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp for storage in a TEXT column
pub fn to_db_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a timestamp previously written by [`to_db_timestamp`]
///
/// Any RFC 3339 offset is accepted and normalized to UTC. A value that
/// does not parse is a corrupt row, reported as [`Error::Internal`].
pub fn parse_db_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid stored timestamp '{}': {}", value, e)))
}

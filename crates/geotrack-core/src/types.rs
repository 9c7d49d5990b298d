//! Shared date/time types

use chrono::{DateTime as ChronoDateTime, SecondsFormat, Utc};

/// Database DateTime type used for TIMESTAMPTZ columns
///
/// # Example
/// ```rust
/// use geotrack_core::DBDateTime;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// pub struct Row {
///     pub received_at: DBDateTime,
/// }
/// ```
pub type DBDateTime = ChronoDateTime<Utc>;

/// Standard UTC DateTime type used in API payloads
pub type UtcDateTime = ChronoDateTime<Utc>;

/// Format an instant the way API responses carry it: RFC 3339, UTC,
/// millisecond precision and a `Z` suffix (`2024-01-15T10:30:00.000Z`).
pub fn to_iso_timestamp(instant: &UtcDateTime) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The current instant formatted with [`to_iso_timestamp`].
pub fn iso_timestamp_now() -> String {
    to_iso_timestamp(&Utc::now())
}

/// Parse an RFC 3339 instant into UTC.
pub fn parse_iso_timestamp(value: &str) -> Option<UtcDateTime> {
    ChronoDateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

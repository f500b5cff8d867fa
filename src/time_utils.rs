// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for backend timestamps.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a backend timestamp.
///
/// The job store writes naive UTC datetimes (`2026-03-01T10:15:00.123456`);
/// anything carrying an offset is converted to UTC.
pub fn parse_backend_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Serde adapter for optional timestamps. Unparseable values become `None`
/// so one bad row does not fail a whole listing.
pub mod lenient {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.as_deref().and_then(|s| {
            let parsed = parse_backend_timestamp(s);
            if parsed.is_none() {
                tracing::debug!(value = s, "Ignoring unparseable timestamp");
            }
            parsed
        }))
    }

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => s.serialize_str(&format_utc_rfc3339(*dt)),
            None => s.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_naive_timestamp_is_utc() {
        let parsed = parse_backend_timestamp("2026-03-01T10:15:00.123456").unwrap();
        assert_eq!(format_utc_rfc3339(parsed), "2026-03-01T10:15:00Z");
    }

    #[test]
    fn test_offset_timestamp_converted() {
        let parsed = parse_backend_timestamp("2026-03-01T15:45:00+05:30").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 3, 1, 10, 15, 0).unwrap());
    }

    #[test]
    fn test_garbage_timestamp() {
        assert!(parse_backend_timestamp("yesterday").is_none());
    }
}

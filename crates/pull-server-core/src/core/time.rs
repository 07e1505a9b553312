// crates/pull-server-core/src/core/time.rs
// ============================================================================
// Module: Pull Server Time
// Description: Server-side timestamps and report time parsing.
// Purpose: Keep wall-clock capture and RFC 3339 parsing in one place.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Server-assigned timestamps are stored as Unix milliseconds. Agent-supplied
//! report times are parsed as RFC 3339 date-times; anything else is rejected
//! before a report is recorded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::validation::ValidationError;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Server-assigned timestamp in Unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from Unix milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Captures the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        Self(i64::try_from(now.as_millis()).unwrap_or(i64::MAX))
    }

    /// Returns the timestamp in Unix milliseconds.
    #[must_use]
    pub const fn unix_millis(self) -> i64 {
        self.0
    }
}

// ============================================================================
// SECTION: Report Times
// ============================================================================

/// Parses an agent-supplied report time.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidTimestamp`] when the value is not an
/// RFC 3339 date-time.
pub fn parse_report_time(field: &'static str, value: &str) -> Result<OffsetDateTime, ValidationError> {
    OffsetDateTime::parse(value.trim(), &Rfc3339).map_err(|err| ValidationError::InvalidTimestamp {
        field,
        value: value.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::parse_report_time;
    use crate::core::validation::ValidationError;

    #[test]
    fn parses_offset_date_times() {
        let parsed = parse_report_time("start_time", "2024-03-01T10:15:30.250+02:00");
        assert!(parsed.is_ok());
    }

    #[test]
    fn rejects_free_text() {
        let parsed = parse_report_time("start_time", "not-a-date");
        assert!(matches!(
            parsed,
            Err(ValidationError::InvalidTimestamp { field: "start_time", .. })
        ));
    }
}

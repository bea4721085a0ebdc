//! Canonical date handling.
//!
//! Day-level streak comparisons use a canonical `YYYY-MM-DD` string form.
//! "Today" is always computed against an explicit [`DateAnchor`] rather
//! than an implicit process default, so deployments can pin streak days to
//! UTC or a fixed offset instead of whatever timezone the host happens to
//! run in.

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InvalidInput;

/// Format string for canonical date serialization.
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Timezone anchor for day-level computations.
///
/// Determines which wall clock `today()` reads and how naive due
/// date/times are converted to absolute instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DateAnchor {
    /// The evaluating process's local timezone.
    #[default]
    Local,
    /// Coordinated Universal Time.
    Utc,
    /// A fixed offset from UTC, in whole hours.
    Fixed { offset_hours: i32 },
}

impl DateAnchor {
    /// Current calendar date under this anchor.
    pub fn today(&self) -> NaiveDate {
        match self {
            DateAnchor::Local => Local::now().date_naive(),
            DateAnchor::Utc => Utc::now().date_naive(),
            DateAnchor::Fixed { offset_hours } => Utc::now()
                .with_timezone(&self.fixed_offset(*offset_hours))
                .date_naive(),
        }
    }

    /// Current calendar date as a canonical `YYYY-MM-DD` string.
    pub fn today_string(&self) -> String {
        format_canonical(self.today())
    }

    /// Convert a naive wall-clock datetime in this anchor's zone to UTC.
    ///
    /// Ambiguous or nonexistent local times (DST transitions) resolve to
    /// the earliest valid instant, falling back to a UTC reading.
    pub fn to_utc(&self, naive: NaiveDateTime) -> DateTime<Utc> {
        match self {
            DateAnchor::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| Utc.from_utc_datetime(&naive)),
            DateAnchor::Utc => Utc.from_utc_datetime(&naive),
            DateAnchor::Fixed { offset_hours } => self
                .fixed_offset(*offset_hours)
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| Utc.from_utc_datetime(&naive)),
        }
    }

    fn fixed_offset(&self, offset_hours: i32) -> FixedOffset {
        // Out-of-range offsets collapse to UTC rather than panicking.
        FixedOffset::east_opt(offset_hours.clamp(-23, 23) * 3600)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"))
    }
}

/// Parse a canonical `YYYY-MM-DD` date string.
pub fn parse_canonical(s: &str) -> Result<NaiveDate, InvalidInput> {
    NaiveDate::parse_from_str(s, CANONICAL_DATE_FORMAT)
        .map_err(|_| InvalidInput::BadDate(s.to_string()))
}

/// Serialize a date to its canonical `YYYY-MM-DD` form.
pub fn format_canonical(date: NaiveDate) -> String {
    date.format(CANONICAL_DATE_FORMAT).to_string()
}

/// Canonical date exactly one calendar day before the reference date.
pub fn yesterday_of(reference: &str) -> Result<String, InvalidInput> {
    let date = parse_canonical(reference)?;
    Ok(format_canonical(date - Duration::days(1)))
}

/// Parse a `HH:MM` 24-hour clock time.
pub fn parse_clock(s: &str) -> Result<NaiveTime, InvalidInput> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| InvalidInput::BadTime(s.to_string()))
}

/// Parse an RFC 3339 datetime into a UTC instant.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, InvalidInput> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| InvalidInput::BadInstant(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_roundtrip() {
        let date = parse_canonical("2025-06-10").unwrap();
        assert_eq!(format_canonical(date), "2025-06-10");
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(parse_canonical("06/10/2025").is_err());
        assert!(parse_canonical("2025-13-40").is_err());
        assert!(parse_canonical("").is_err());
    }

    #[test]
    fn yesterday_subtracts_one_calendar_day() {
        assert_eq!(yesterday_of("2025-06-10").unwrap(), "2025-06-09");
        // Month and year boundaries
        assert_eq!(yesterday_of("2025-03-01").unwrap(), "2025-02-28");
        assert_eq!(yesterday_of("2025-01-01").unwrap(), "2024-12-31");
        // Leap day
        assert_eq!(yesterday_of("2024-03-01").unwrap(), "2024-02-29");
    }

    #[test]
    fn clock_parsing() {
        assert_eq!(
            parse_clock("14:05").unwrap(),
            NaiveTime::from_hms_opt(14, 5, 0).unwrap()
        );
        assert!(parse_clock("25:00").is_err());
        assert!(parse_clock("9am").is_err());
    }

    #[test]
    fn fixed_anchor_converts_wall_clock_to_utc() {
        let anchor = DateAnchor::Fixed { offset_hours: 9 };
        let naive = NaiveDate::from_ymd_opt(2025, 6, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let utc = anchor.to_utc(naive);
        assert_eq!(utc.to_rfc3339(), "2025-06-10T00:00:00+00:00");
    }

    #[test]
    fn utc_and_fixed_anchors_can_disagree_on_today() {
        // A +14 and a -12 anchor are never on the same calendar date at
        // the same instant unless both read the same day; we only check
        // the anchors produce parseable canonical dates.
        let a = DateAnchor::Fixed { offset_hours: 14 }.today_string();
        let b = DateAnchor::Fixed { offset_hours: -12 }.today_string();
        assert!(parse_canonical(&a).is_ok());
        assert!(parse_canonical(&b).is_ok());
    }

    #[test]
    fn instant_parsing() {
        let t = parse_instant("2025-06-10T12:00:00+02:00").unwrap();
        assert_eq!(t.to_rfc3339(), "2025-06-10T10:00:00+00:00");
        assert!(parse_instant("not-a-time").is_err());
    }
}

//! KST timestamps and calendar-day helpers.
//!
//! Audit columns (`created_date`, `updated_date`) hold the UTC wall clock shifted
//! by nine hours and written with a literal `+09:00` suffix, millisecond precision.
//! The format is fixed so that string ordering matches time ordering.

use crate::errors::{Error, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};

const KST_OFFSET_HOURS: i64 = 9;
const KST_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f+09:00";
const DAY_FORMAT: &str = "%Y-%m-%d";

/// Current time as a KST timestamp string.
#[must_use]
pub fn kst_now() -> String {
    kst_string(Utc::now())
}

/// Formats an instant as a KST timestamp string.
#[must_use]
pub fn kst_string(instant: DateTime<Utc>) -> String {
    (instant.naive_utc() + Duration::hours(KST_OFFSET_HOURS))
        .format(KST_FORMAT)
        .to_string()
}

/// Today's calendar day in KST.
#[must_use]
pub fn kst_today() -> NaiveDate {
    (Utc::now().naive_utc() + Duration::hours(KST_OFFSET_HOURS)).date()
}

/// Parses a `YYYY-MM-DD` calendar day.
pub fn parse_day(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DAY_FORMAT).map_err(|_| Error::InvalidDate {
        value: value.to_string(),
    })
}

/// Validates a calendar day and returns it zero-padded, the form stored in `date` columns.
pub fn normalize_day(value: &str) -> Result<String> {
    parse_day(value).map(format_day)
}

/// Formats a calendar day as `YYYY-MM-DD`.
#[must_use]
pub fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

/// `LIKE` prefix (`"YYYY-MM-"`) matching every day of a month.
pub fn month_prefix(year: i32, month: u32) -> Result<String> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|first| first.format("%Y-%m-").to_string())
        .ok_or_else(|| Error::InvalidDate {
            value: format!("{year}-{month}"),
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_kst_string_adds_nine_hours() {
        let instant = Utc.with_ymd_and_hms(2025, 9, 1, 20, 30, 5).unwrap();
        assert_eq!(kst_string(instant), "2025-09-02T05:30:05.000+09:00");
    }

    #[test]
    fn test_kst_string_keeps_milliseconds() {
        let instant = Utc.timestamp_millis_opt(1_756_684_800_123).unwrap();
        assert_eq!(kst_string(instant), "2025-09-01T09:00:00.123+09:00");
    }

    #[test]
    fn test_kst_now_shape() {
        let now = kst_now();
        assert_eq!(now.len(), "2025-09-01T09:00:00.000+09:00".len());
        assert!(now.ends_with("+09:00"));
    }

    #[test]
    fn test_normalize_day() {
        assert_eq!(normalize_day("2025-09-01").unwrap(), "2025-09-01");
        assert_eq!(normalize_day(" 2025-9-1 ").unwrap(), "2025-09-01");
        assert!(matches!(
            normalize_day("2025-02-30"),
            Err(Error::InvalidDate { .. })
        ));
        assert!(normalize_day("yesterday").is_err());
    }

    #[test]
    fn test_month_prefix() {
        assert_eq!(month_prefix(2025, 9).unwrap(), "2025-09-");
        assert!(month_prefix(2025, 13).is_err());
        assert!(month_prefix(2025, 0).is_err());
    }
}

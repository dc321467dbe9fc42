//! Calendar-day parsing for record dates.
//!
//! Records arrive with dates in several shapes: plain ISO days from forms,
//! full timestamps from older exports, and `M/D/YYYY` strings for weather
//! days. Everything is reduced to a [`NaiveDate`] in local time; no timezone
//! normalization beyond that is performed.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

/// Parse a record date into a calendar day.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(day);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Local).date_naive());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.date());
    }
    NaiveDate::parse_from_str(raw, "%m/%d/%Y").ok()
}

/// Serde adapter storing a day as `YYYY-MM-DD` and reading any form
/// accepted by [`parse_day`].
pub mod calendar_day {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(day: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&day.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_day(&raw)
            .ok_or_else(|| de::Error::custom(format!("unrecognized date: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso_day() {
        assert_eq!(
            parse_day("2024-06-01"),
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
    }

    #[test]
    fn test_parse_locale_day() {
        assert_eq!(
            parse_day("6/1/2024"),
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
    }

    #[test]
    fn test_parse_naive_timestamp() {
        assert_eq!(
            parse_day("2024-06-01T08:30:00.000"),
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_day("next tuesday").is_none());
        assert!(parse_day("").is_none());
    }
}

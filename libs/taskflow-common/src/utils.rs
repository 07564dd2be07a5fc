//! Utility functions for TaskFlow

use crate::constants::DATE_FORMATS;
use chrono::{DateTime, NaiveDate, Utc};

/// Format a date in the wire format (`YYYY-MM-DD`)
#[must_use]
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format a datetime for display
#[must_use]
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Parse a date string using the accepted date formats
///
/// A date-time string such as `2024-01-01T09:30:00Z` is accepted and its time
/// part ignored.
///
/// # Errors
/// Returns `chrono::ParseError` if no supported format matches
pub fn parse_date(date_str: &str) -> Result<NaiveDate, chrono::ParseError> {
    let trimmed = date_str.trim();
    let mut last_error = None;

    for format in DATE_FORMATS {
        match NaiveDate::parse_from_str(trimmed, format) {
            Ok(date) => return Ok(date),
            Err(e) => last_error = Some(e),
        }
    }

    // Date-time values: keep the calendar part
    if let Some(prefix) = trimmed.get(..10) {
        if trimmed.len() > 10 {
            if let Ok(date) = NaiveDate::parse_from_str(prefix, DATE_FORMATS[0]) {
                return Ok(date);
            }
        }
    }

    match last_error {
        Some(e) => Err(e),
        None => NaiveDate::parse_from_str(trimmed, DATE_FORMATS[0]),
    }
}

/// Short human label for a due date relative to `today`
///
/// `Today`, `Tomorrow`, otherwise an abbreviated month and day (`Oct 21`).
#[must_use]
pub fn due_label(date: &NaiveDate, today: &NaiveDate) -> String {
    if date == today {
        return "Today".to_string();
    }
    if today.succ_opt().as_ref() == Some(date) {
        return "Tomorrow".to_string();
    }
    date.format("%b %d").to_string()
}

/// Truncate a string to a maximum length
#[must_use]
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(format_date(&date), "2024-02-29");
    }

    #[test]
    fn test_format_datetime() {
        let dt = DateTime::parse_from_rfc3339("2024-01-01T10:20:30Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_datetime(&dt), "2024-01-01 10:20:30 UTC");
    }

    #[test]
    fn test_parse_date_wire_format() {
        let date = parse_date("2024-01-01").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_parse_date_us_format() {
        let date = parse_date("12/25/2023").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2023, 12, 25).unwrap());
    }

    #[test]
    fn test_parse_date_with_time_part() {
        let date = parse_date("2024-05-06T00:00:00.000Z").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 5, 6).unwrap());
    }

    #[test]
    fn test_parse_date_trims_whitespace() {
        assert!(parse_date("  2024-05-06 ").is_ok());
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date("not a date").is_err());
        assert!(parse_date("2024-13-45").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_due_label() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let tomorrow = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        let later = NaiveDate::from_ymd_opt(2026, 10, 21).unwrap();
        let earlier = NaiveDate::from_ymd_opt(2026, 9, 2).unwrap();

        assert_eq!(due_label(&today, &today), "Today");
        assert_eq!(due_label(&tomorrow, &today), "Tomorrow");
        assert_eq!(due_label(&later, &today), "Oct 21");
        assert_eq!(due_label(&earlier, &today), "Sep 02");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("hello world", 5), "he...");
        assert_eq!(truncate_string("hello", 5), "hello");
        assert_eq!(truncate_string("", 5), "");
    }

    #[test]
    fn test_truncate_string_multibyte() {
        assert_eq!(truncate_string("ééééééé", 5), "éé...");
    }
}

//! Canonicalization and validation of raw field values.
//!
//! Every function here is pure: no I/O, no dependence on the local time
//! zone. Date expressions that carry an offset are anchored to UTC.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;

use super::{Email, EventDate, EventTime};
use crate::error::StoreError;

#[allow(clippy::expect_used)]
static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").expect("literal pattern"));

#[allow(clippy::expect_used)]
static CLOCK_24H_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})(?::\d{2})?$").expect("literal pattern"));

#[allow(clippy::expect_used)]
static CLOCK_12H_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d{1,2})(?::(\d{2}))?\s*(am|pm)$").expect("literal pattern")
});

#[allow(clippy::expect_used)]
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("literal pattern"));

/// Naive date-time layouts accepted when the input is not an ISO date.
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Date-only layouts accepted when the input is not an ISO date.
const DATE_FORMATS: [&str; 10] = [
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%A, %B %d, %Y",
    "%a, %b %d, %Y",
];

/// Returns `true` when the trimmed value is non-empty.
#[must_use]
pub fn require_non_empty(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Trims `value` and rejects it with a field-specific error when empty.
///
/// # Errors
///
/// Returns [`StoreError::ValidationFailed`] naming `field`.
pub fn required(field: &'static str, value: &str) -> Result<String, StoreError> {
    if require_non_empty(value) {
        Ok(value.trim().to_string())
    } else {
        Err(StoreError::empty_field(field))
    }
}

/// Trims each element and drops the ones that become empty.
///
/// Surviving elements keep their relative order.
#[must_use]
pub fn normalize_string_list<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.as_ref().trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Converts a raw date expression to a canonical calendar date.
///
/// `YYYY-MM-DD` input is checked for real calendar validity. Any other
/// recognized expression (unpadded ISO, RFC 3339, RFC 2822, common
/// written forms) is converted, with offset-bearing values taken in UTC.
///
/// # Errors
///
/// Returns [`StoreError::InvalidDate`] for empty, unparseable or
/// impossible dates such as `2024-02-30`.
pub fn normalize_date(raw: &str) -> Result<EventDate, StoreError> {
    let value = raw.trim();
    let invalid = || StoreError::InvalidDate(raw.to_string());
    if value.is_empty() {
        return Err(invalid());
    }

    if let Some(caps) = ISO_DATE_RE.captures(value) {
        let year = caps.get(1).and_then(|m| m.as_str().parse::<i32>().ok());
        let month = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
        let day = caps.get(3).and_then(|m| m.as_str().parse::<u32>().ok());
        return match (year, month, day) {
            (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(y, m, d)
                .map(EventDate::from)
                .ok_or_else(invalid),
            _ => Err(invalid()),
        };
    }

    parse_date_expression(value)
        .map(EventDate::from)
        .ok_or_else(invalid)
}

fn parse_date_expression(value: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    let with_z = value.strip_suffix('Z').unwrap_or(value);
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(with_z, fmt).ok())
    {
        return Some(dt.date());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Converts a raw clock time to canonical 24-hour `HH:mm`.
///
/// Accepts `H:mm` / `HH:mm[:ss]` (hours 0–23) and `H[:mm] am|pm`
/// (hours 1–12, meridiem case-insensitive). Seconds are discarded.
///
/// # Errors
///
/// Returns [`StoreError::InvalidTime`] for anything else or for
/// out-of-range components.
pub fn normalize_time(raw: &str) -> Result<EventTime, StoreError> {
    let value = raw.trim();
    let invalid = || StoreError::InvalidTime(raw.to_string());

    if let Some(caps) = CLOCK_24H_RE.captures(value) {
        let hours = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
        let minutes = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
        return match (hours, minutes) {
            (Some(h), Some(m)) if h <= 23 && m <= 59 => {
                NaiveTime::from_hms_opt(h, m, 0).map(EventTime::from).ok_or_else(invalid)
            }
            _ => Err(invalid()),
        };
    }

    if let Some(caps) = CLOCK_12H_RE.captures(value) {
        let hours = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
        let minutes = match caps.get(2) {
            Some(m) => m.as_str().parse::<u32>().ok(),
            None => Some(0),
        };
        let is_pm = caps
            .get(3)
            .is_some_and(|m| m.as_str().eq_ignore_ascii_case("pm"));
        return match (hours, minutes) {
            (Some(h), Some(m)) if (1..=12).contains(&h) && m <= 59 => {
                let h24 = match (h, is_pm) {
                    (12, false) => 0,
                    (12, true) => 12,
                    (h, true) => h + 12,
                    (h, false) => h,
                };
                NaiveTime::from_hms_opt(h24, m, 0)
                    .map(EventTime::from)
                    .ok_or_else(invalid)
            }
            _ => Err(invalid()),
        };
    }

    Err(invalid())
}

/// Normalizes an attendee email: trims, lowercases, checks the
/// `local@domain.tld` shape.
///
/// # Errors
///
/// Returns [`StoreError::InvalidEmail`] when the shape check fails.
pub fn normalize_email(raw: &str) -> Result<Email, StoreError> {
    let value = raw.trim().to_lowercase();
    if EMAIL_RE.is_match(&value) {
        Ok(Email::from_normalized(value))
    } else {
        Err(StoreError::InvalidEmail(raw.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn date(raw: &str) -> String {
        let Ok(d) = normalize_date(raw) else {
            panic!("expected {raw:?} to parse as a date");
        };
        d.to_string()
    }

    fn time(raw: &str) -> String {
        let Ok(t) = normalize_time(raw) else {
            panic!("expected {raw:?} to parse as a time");
        };
        t.to_string()
    }

    #[test]
    fn iso_dates_are_checked_for_calendar_validity() {
        assert_eq!(date("2024-02-29"), "2024-02-29");
        assert!(matches!(
            normalize_date("2024-02-30"),
            Err(StoreError::InvalidDate(_))
        ));
        assert!(normalize_date("2023-02-29").is_err());
        assert!(normalize_date("2024-13-01").is_err());
    }

    #[test]
    fn loose_dates_are_padded() {
        assert_eq!(date("2024-3-5"), "2024-03-05");
        assert_eq!(date(" 2024-03-05 "), "2024-03-05");
    }

    #[test]
    fn date_expressions_convert_to_iso() {
        assert_eq!(date("March 5, 2024"), "2024-03-05");
        assert_eq!(date("Mar 5, 2024"), "2024-03-05");
        assert_eq!(date("03/05/2024"), "2024-03-05");
        assert_eq!(date("2024/03/05"), "2024-03-05");
        assert_eq!(date("2024-03-05T10:30:00"), "2024-03-05");
    }

    #[test]
    fn offset_dates_are_anchored_to_utc() {
        assert_eq!(date("2024-03-05T23:30:00-05:00"), "2024-03-06");
        assert_eq!(date("Tue, 5 Mar 2024 10:00:00 +0000"), "2024-03-05");
    }

    #[test]
    fn empty_or_garbage_dates_fail() {
        for raw in ["", "   ", "tomorrow", "2024-03", "05.03.2024x"] {
            assert!(
                matches!(normalize_date(raw), Err(StoreError::InvalidDate(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn twenty_four_hour_times_are_padded() {
        assert_eq!(time("9:05"), "09:05");
        assert_eq!(time("09:05"), "09:05");
        assert_eq!(time("23:59:59"), "23:59");
        assert_eq!(time("0:00"), "00:00");
    }

    #[test]
    fn twelve_hour_times_convert() {
        assert_eq!(time("11:05 PM"), "23:05");
        assert_eq!(time("11:05pm"), "23:05");
        assert_eq!(time("12 am"), "00:00");
        assert_eq!(time("12:30 PM"), "12:30");
        assert_eq!(time("7 Am"), "07:00");
    }

    #[test]
    fn out_of_range_or_malformed_times_fail() {
        for raw in ["25:00", "12:60", "0 pm", "13 pm", "9", "9:5", "noon", ""] {
            assert!(
                matches!(normalize_time(raw), Err(StoreError::InvalidTime(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn string_lists_drop_blank_items_in_order() {
        let raw = vec![" intro ", "", "   ", "keynote", "q&a "];
        assert_eq!(normalize_string_list(&raw), vec!["intro", "keynote", "q&a"]);
        assert!(normalize_string_list::<&str>(&[]).is_empty());
    }

    #[test]
    fn required_trims_or_names_the_field() {
        assert!(require_non_empty(" x "));
        assert!(!require_non_empty(" \t "));
        let Ok(v) = required("venue", "  Hall A ") else {
            panic!("expected a value");
        };
        assert_eq!(v, "Hall A");
        let Err(err) = required("venue", "  ") else {
            panic!("expected an error");
        };
        assert_eq!(err.field(), Some("venue"));
    }

    #[test]
    fn emails_are_folded_and_checked() {
        let Ok(email) = normalize_email("  Ada@Example.COM ") else {
            panic!("expected a valid email");
        };
        assert_eq!(email.as_str(), "ada@example.com");
        for raw in ["abc@", "@gmail.com", "test@@gmail.com", "a b@c.com", "a@b"] {
            assert!(
                matches!(normalize_email(raw), Err(StoreError::InvalidEmail(_))),
                "{raw:?} should be rejected"
            );
        }
    }
}

//! Lenient field decoding and format checks
//!
//! Stored documents are not schema-validated before they reach list views, so
//! every decoder here is total: anything it cannot read becomes `""` or `0`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::{Value, json};
use std::borrow::Cow;
use std::sync::OnceLock;

/// Textual form of a field value
///
/// Strings are borrowed, numbers and booleans are rendered, anything else
/// (absent, null, arrays, objects) is the empty string.
pub fn text(value: Option<&Value>) -> Cow<'_, str> {
    match value {
        Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
        Some(Value::Number(n)) => Cow::Owned(n.to_string()),
        Some(Value::Bool(b)) => Cow::Owned(b.to_string()),
        _ => Cow::Borrowed(""),
    }
}

/// Decode a timestamp or date field to epoch milliseconds
///
/// Accepted shapes:
/// - RFC 3339 strings (`2024-01-15T10:00:00Z`)
/// - calendar dates (`2024-01-15`, read as UTC midnight)
/// - local date-times without offset (`2024-01-15T10:00`, read as UTC)
/// - numbers and numeric strings (milliseconds)
/// - timestamp objects (`{"seconds": 1705312800, "nanoseconds": 0}`)
///
/// Everything else decodes to 0, the earliest possible value.
pub fn epoch_millis(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => parse_millis(s.trim()).unwrap_or(0),
        Some(Value::Object(map)) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64);
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_i64)
                .unwrap_or(0);
            seconds.map(|s| s * 1000 + nanos / 1_000_000).unwrap_or(0)
        }
        _ => 0,
    }
}

fn parse_millis(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis());
    }
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(|f| f as i64)
}

/// Decode a calendar date (`YYYY-MM-DD` or any timestamp shape)
pub fn date(value: Option<&Value>) -> Option<NaiveDate> {
    if let Some(Value::String(s)) = value
        && let Ok(date) = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
    {
        return Some(date);
    }
    match epoch_millis(value) {
        0 => None,
        millis => DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive()),
    }
}

/// Coerce a form value to a number, non-numeric input becomes 0
pub fn number(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite()).unwrap_or(0.0)
}

/// Coerce a form value to a JSON number, keeping integers integral
pub fn numeric(value: Option<&Value>) -> Value {
    let n = number(value);
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        json!(n as i64)
    } else {
        json!(n)
    }
}

/// Field format validators
#[derive(Debug, Clone)]
pub enum FieldFormat {
    Email,
    Url,
    Custom(Regex),
}

impl FieldFormat {
    /// Check a string against this format
    pub fn is_valid(&self, value: &str) -> bool {
        match self {
            FieldFormat::Email => email_regex().is_match(value),
            FieldFormat::Url => url_regex().is_match(value),
            FieldFormat::Custom(regex) => regex.is_match(value),
        }
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
    })
}

fn url_regex() -> &'static Regex {
    static URL_REGEX: OnceLock<Regex> = OnceLock::new();
    URL_REGEX.get_or_init(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("valid url regex"))
}

//! Reusable field filters
//!
//! These filters normalize form values before validation

use crate::core::field;
use serde_json::Value;

/// Filter: trim whitespace from string
pub fn trim() -> impl Fn(&str, Value) -> Value + Send + Sync + Clone {
    |_: &str, value: Value| match value {
        Value::String(s) => Value::String(s.trim().to_string()),
        other => other,
    }
}

/// Filter: coerce to a number, anything non-numeric becomes 0
pub fn number() -> impl Fn(&str, Value) -> Value + Send + Sync + Clone {
    |_: &str, value: Value| field::numeric(Some(&value))
}

/// Filter: replace null and blank strings with a default
pub fn default_to(default: Value) -> impl Fn(&str, Value) -> Value + Send + Sync + Clone {
    move |_: &str, value: Value| match &value {
        Value::Null => default.clone(),
        Value::String(s) if s.trim().is_empty() => default.clone(),
        _ => value,
    }
}

/// Filter: convert string to lowercase
pub fn lowercase() -> impl Fn(&str, Value) -> Value + Send + Sync + Clone {
    |_: &str, value: Value| match value {
        Value::String(s) => Value::String(s.to_lowercase()),
        other => other,
    }
}

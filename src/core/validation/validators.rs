//! Reusable field validators
//!
//! A validator receives the field name and its (already filtered) value and
//! returns a message when the value is unacceptable. Forms decide which
//! message the user finally sees.

use crate::core::field::FieldFormat;
use serde_json::Value;

/// Validator: field is present and, for strings, not blank
pub fn required() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| match value {
        Value::Null => Err(format!("'{}' is required", field)),
        Value::String(s) if s.trim().is_empty() => Err(format!("'{}' is required", field)),
        _ => Ok(()),
    }
}

/// Validator: field is optional (always valid)
pub fn optional() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |_: &str, _: &Value| Ok(())
}

/// Validator: string must have at least `min` characters
pub fn min_length(min: usize) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| {
        if let Some(s) = value.as_str()
            && s.chars().count() < min
        {
            return Err(format!("'{}' must be at least {} characters", field, min));
        }
        Ok(())
    }
}

/// Validator: value must be in allowed list
pub fn in_list(
    allowed: &'static [&'static str],
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| {
        if let Some(s) = value.as_str()
            && !allowed.contains(&s)
        {
            return Err(format!(
                "'{}' must be one of {:?} (got: {})",
                field, allowed, s
            ));
        }
        Ok(())
    }
}

/// Validator: string must match a format
pub fn format(format: FieldFormat) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| {
        if let Some(s) = value.as_str()
            && !s.is_empty()
            && !format.is_valid(s)
        {
            let kind = match format {
                FieldFormat::Email => "an email address",
                FieldFormat::Url => "a URL",
                FieldFormat::Custom(_) => "in the expected format",
            };
            return Err(format!("'{}' must be {}", field, kind));
        }
        Ok(())
    }
}

/// Validator: date must match format
pub fn date_format(
    format: &'static str,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| {
        if let Some(s) = value.as_str()
            && !s.is_empty()
            && chrono::NaiveDate::parse_from_str(s, format).is_err()
        {
            return Err(format!("'{}' must use the format {} (got: {})", field, format, s));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required() {
        let v = required();
        assert!(v("title", &json!("Physics")).is_ok());
        assert!(v("title", &json!(0)).is_ok());

        let err = v("title", &json!(null)).unwrap_err();
        assert!(err.contains("required"));
        assert!(v("title", &json!("   ")).is_err());
    }

    #[test]
    fn test_optional() {
        assert!(optional()("anything", &json!(null)).is_ok());
    }

    #[test]
    fn test_min_length() {
        let v = min_length(6);
        assert!(v("password", &json!("secret")).is_ok());
        assert!(v("password", &json!("short")).is_err());
        assert!(v("password", &json!(12)).is_ok());
    }

    #[test]
    fn test_in_list() {
        let v = in_list(&["hard", "normal", "medium"]);
        assert!(v("level", &json!("hard")).is_ok());
        let err = v("level", &json!("extreme")).unwrap_err();
        assert!(err.contains("extreme"));
        assert!(v("level", &json!(null)).is_ok());
    }

    #[test]
    fn test_format() {
        let v = format(FieldFormat::Url);
        assert!(v("url", &json!("https://example.com/a.pdf")).is_ok());
        assert!(v("url", &json!("")).is_ok());
        assert!(v("url", &json!("not a url")).is_err());

        let v = format(FieldFormat::Email);
        assert!(v("email", &json!("someone@example.com")).is_ok());
        assert!(v("email", &json!("someone")).is_err());
    }

    #[test]
    fn test_date_format() {
        let v = date_format("%Y-%m-%d");
        assert!(v("examDate", &json!("2024-06-01")).is_ok());
        assert!(v("examDate", &json!("01/06/2024")).is_err());
    }
}

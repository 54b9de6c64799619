//! Typed field values and their JSON conversions.
//!
//! Record payloads arrive as JSON objects keyed by field name. Each value is
//! checked against the field's declared type before anything touches
//! storage; a payload that fails conversion never produces a partial write.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::Value as JsonValue;

use super::field::FieldType;

/// Builds a lazily-compiled regex from a literal pattern.
macro_rules! lazy_regex {
    ($pattern:expr) => {
        LazyLock::new(|| Regex::new($pattern).unwrap_or_else(|_| unreachable!()))
    };
}

static EMAIL_PATTERN: LazyLock<Regex> =
    lazy_regex!(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$");

/// A validated value held by a record field.
///
/// All three text field types share the [`FieldValue::Text`] variant; the
/// distinction between them lives in validation, not representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Value of a text or email field.
    Text(String),
    /// Value of a number field. Always finite.
    Number(f64),
    /// Value of a boolean field.
    Boolean(bool),
    /// Value of a date field.
    Date(NaiveDate),
    /// Value of a datetime field, normalized to UTC.
    DateTime(DateTime<Utc>),
}

impl FieldValue {
    /// Converts a JSON value into a typed field value.
    ///
    /// Returns a human-readable reason on failure. JSON `null` is never
    /// accepted here; callers decide what absence means.
    pub fn from_json(field_type: FieldType, value: &JsonValue) -> Result<Self, String> {
        match field_type {
            FieldType::SingleLineText | FieldType::MultiLineText | FieldType::Email => {
                let text = value
                    .as_str()
                    .ok_or_else(|| format!("expected a string, got {}", json_kind(value)))?;
                validate_text(field_type, text)?;
                Ok(Self::Text(text.to_string()))
            }
            FieldType::Number => {
                let number = value
                    .as_f64()
                    .ok_or_else(|| format!("expected a number, got {}", json_kind(value)))?;
                if !number.is_finite() {
                    return Err("must be a finite number".to_string());
                }
                Ok(Self::Number(number))
            }
            FieldType::Boolean => value
                .as_bool()
                .map(Self::Boolean)
                .ok_or_else(|| format!("expected a boolean, got {}", json_kind(value))),
            FieldType::Date => {
                let text = value
                    .as_str()
                    .ok_or_else(|| format!("expected a string, got {}", json_kind(value)))?;
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .map(Self::Date)
                    .map_err(|_| format!("expected a date in YYYY-MM-DD format, got '{text}'"))
            }
            FieldType::DateTime => {
                let text = value
                    .as_str()
                    .ok_or_else(|| format!("expected a string, got {}", json_kind(value)))?;
                DateTime::parse_from_rfc3339(text)
                    .map(|dt| Self::DateTime(dt.with_timezone(&Utc)))
                    .map_err(|_| format!("expected an RFC 3339 timestamp, got '{text}'"))
            }
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::DateTime(dt) => {
                write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::Micros, true))
            }
        }
    }
}

/// Checks a text value against the constraints of a text field type.
///
/// Single-line text rejects line breaks; email additionally requires an
/// address shape. Multi-line text accepts anything.
pub fn validate_text(field_type: FieldType, text: &str) -> Result<(), String> {
    match field_type {
        FieldType::SingleLineText => {
            if text.contains('\n') || text.contains('\r') {
                return Err("must not contain line breaks".to_string());
            }
            Ok(())
        }
        FieldType::Email => {
            if !is_valid_email(text) {
                return Err(format!("'{text}' is not a valid email address"));
            }
            Ok(())
        }
        FieldType::MultiLineText => Ok(()),
        other => Err(format!("{other} is not a text type")),
    }
}

/// Returns true when the string looks like an email address.
#[must_use]
pub fn is_valid_email(text: &str) -> bool {
    EMAIL_PATTERN.is_match(text)
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test]
    fn test_text_conversion() {
        let value = FieldValue::from_json(FieldType::SingleLineText, &json!("hello")).unwrap();
        assert_eq!(value, FieldValue::Text("hello".to_string()));

        let err = FieldValue::from_json(FieldType::SingleLineText, &json!("one\ntwo"));
        assert!(err.is_err());

        let multi = FieldValue::from_json(FieldType::MultiLineText, &json!("one\ntwo")).unwrap();
        assert_eq!(multi, FieldValue::Text("one\ntwo".to_string()));
    }

    #[test_case(json!(42) => matches Ok(FieldValue::Number(_)); "integer")]
    #[test_case(json!(12.5) => matches Ok(FieldValue::Number(_)); "fraction")]
    #[test_case(json!(-0.001) => matches Ok(FieldValue::Number(_)); "negative")]
    #[test_case(json!("12.5") => matches Err(_); "string rejected")]
    #[test_case(json!(true) => matches Err(_); "boolean rejected")]
    #[test_case(json!([1]) => matches Err(_); "array rejected")]
    fn test_number_conversion(value: JsonValue) -> Result<FieldValue, String> {
        FieldValue::from_json(FieldType::Number, &value)
    }

    #[test]
    fn test_number_value_is_preserved() {
        let value = FieldValue::from_json(FieldType::Number, &json!(42)).unwrap();
        assert_eq!(value, FieldValue::Number(42.0));
    }

    #[test]
    fn test_boolean_conversion() {
        assert_eq!(
            FieldValue::from_json(FieldType::Boolean, &json!(false)).unwrap(),
            FieldValue::Boolean(false)
        );
        assert!(FieldValue::from_json(FieldType::Boolean, &json!(1)).is_err());
    }

    #[test]
    fn test_date_conversion() {
        let value = FieldValue::from_json(FieldType::Date, &json!("2025-03-14")).unwrap();
        assert_eq!(value.to_string(), "2025-03-14");

        assert!(FieldValue::from_json(FieldType::Date, &json!("14/03/2025")).is_err());
        assert!(FieldValue::from_json(FieldType::Date, &json!("2025-02-30")).is_err());
    }

    #[test]
    fn test_datetime_normalizes_to_utc() {
        let value =
            FieldValue::from_json(FieldType::DateTime, &json!("2025-03-14T12:00:00+02:00"))
                .unwrap();
        assert_eq!(value.to_string(), "2025-03-14T10:00:00.000000Z");

        assert!(FieldValue::from_json(FieldType::DateTime, &json!("2025-03-14")).is_err());
    }

    #[test]
    fn test_null_is_rejected() {
        for field_type in FieldType::ALL {
            assert!(FieldValue::from_json(field_type, &JsonValue::Null).is_err());
        }
    }

    #[test_case("user@example.com", true)]
    #[test_case("first.last+tag@sub.domain.org", true)]
    #[test_case("no-at-sign", false)]
    #[test_case("user@", false)]
    #[test_case("user@domain", false)]
    #[test_case("user@domain.c", false)]
    #[test_case("", false)]
    fn test_email_validation(input: &str, valid: bool) {
        assert_eq!(is_valid_email(input), valid);
        assert_eq!(
            FieldValue::from_json(FieldType::Email, &json!(input)).is_ok(),
            valid
        );
    }

    #[test]
    fn test_serializes_untagged() {
        assert_eq!(
            serde_json::to_value(FieldValue::Text("a".to_string())).unwrap(),
            json!("a")
        );
        assert_eq!(
            serde_json::to_value(FieldValue::Number(2.5)).unwrap(),
            json!(2.5)
        );
        assert_eq!(
            serde_json::to_value(FieldValue::Boolean(true)).unwrap(),
            json!(true)
        );
        assert_eq!(
            serde_json::to_value(FieldValue::Date(
                NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
            ))
            .unwrap(),
            json!("2025-03-14")
        );
    }
}

//! Per-value coercion rules shared by every entity.
//!
//! Upstream payloads are loosely typed: counters arrive as strings, flags as
//! `0`/`1`, timestamps either as unix seconds or ISO-8601 text. Each function
//! here turns one raw JSON value into its target type or reports why it
//! could not. Whether a failure rejects the entity or degrades the field to
//! absent is decided by the caller (see `fields::FieldReader`).

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::error::CoerceError;

/// Strings that read as `true`; everything else is `false`.
const TRUE_WORDS: [&str; 3] = ["true", "1", "yes"];

/// Naive layouts tried after RFC 3339, read as UTC.
const NAIVE_LAYOUTS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn wrong_type(expected: &'static str, value: &Value) -> CoerceError {
    CoerceError::WrongType {
        expected,
        found: kind_of(value),
    }
}

fn unparsable(expected: &'static str, value: impl ToString) -> CoerceError {
    CoerceError::Unparsable {
        expected,
        value: value.to_string(),
    }
}

/// `i64::MIN` and `2^63` as floats; integral floats outside are refused.
const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

/// Integer: native integers, integral floats and numeric strings.
pub fn int(value: &Value) -> Result<i64, CoerceError> {
    match value {
        Value::Null => Err(CoerceError::Missing),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .filter(|f| (I64_LOWER..I64_UPPER).contains(f))
                    .map(|f| f as i64)
            })
            .ok_or_else(|| unparsable("integer", n)),
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| unparsable("integer", s)),
        other => Err(wrong_type("integer", other)),
    }
}

/// Float: any JSON number and numeric strings. Non-finite values are refused.
pub fn float(value: &Value) -> Result<f64, CoerceError> {
    match value {
        Value::Null => Err(CoerceError::Missing),
        Value::Number(n) => n.as_f64().ok_or_else(|| unparsable("float", n)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .ok_or_else(|| unparsable("float", s)),
        other => Err(wrong_type("float", other)),
    }
}

/// Boolean: native booleans, `{"true","1","yes"}` (case-insensitive) and
/// non-zero numbers are `true`.
pub fn boolean(value: &Value) -> Result<bool, CoerceError> {
    match value {
        Value::Null => Err(CoerceError::Missing),
        Value::Bool(b) => Ok(*b),
        Value::String(s) => {
            let lowered = s.trim().to_ascii_lowercase();
            Ok(TRUE_WORDS.contains(&lowered.as_str()))
        }
        Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
        other => Err(wrong_type("boolean", other)),
    }
}

/// String: native strings; numbers are rendered as their decimal text since
/// upstream sends several identifiers as integers.
pub fn string(value: &Value) -> Result<String, CoerceError> {
    match value {
        Value::Null => Err(CoerceError::Missing),
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(wrong_type("string", other)),
    }
}

/// Like [`string`] but refuses `""`.
pub fn non_empty_string(value: &Value) -> Result<String, CoerceError> {
    let s = string(value)?;
    if s.is_empty() {
        return Err(CoerceError::Empty);
    }
    Ok(s)
}

/// Sequence of strings; `null` is an empty sequence.
pub fn string_list(value: &Value) -> Result<Vec<String>, CoerceError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items.iter().map(string).collect(),
        other => Err(wrong_type("array", other)),
    }
}

/// Timestamp from unix seconds or an ISO-8601 string.
pub fn timestamp(value: &Value) -> Result<DateTime<Utc>, CoerceError> {
    match value {
        Value::Null => Err(CoerceError::Missing),
        Value::Number(_) => from_unix_number(value),
        Value::String(s) => parse_iso8601(s).ok_or_else(|| unparsable("datetime", s)),
        other => Err(wrong_type("datetime", other)),
    }
}

/// Timestamp from unix seconds only. Strings must hold an integer; ISO text
/// is refused.
pub fn unix_timestamp(value: &Value) -> Result<DateTime<Utc>, CoerceError> {
    match value {
        Value::Null => Err(CoerceError::Missing),
        Value::Number(_) => from_unix_number(value),
        Value::String(s) => {
            let secs = s
                .trim()
                .parse::<i64>()
                .map_err(|_| unparsable("unix timestamp", s))?;
            from_unix_seconds(secs).ok_or_else(|| unparsable("unix timestamp", s))
        }
        other => Err(wrong_type("unix timestamp", other)),
    }
}

fn from_unix_number(value: &Value) -> Result<DateTime<Utc>, CoerceError> {
    let Value::Number(n) = value else {
        return Err(wrong_type("unix timestamp", value));
    };

    let parsed = if let Some(secs) = n.as_i64() {
        from_unix_seconds(secs)
    } else {
        n.as_f64().filter(|f| f.is_finite()).and_then(|f| {
            let secs = f.floor();
            let nanos = ((f - secs) * 1e9).round() as u32;
            Utc.timestamp_opt(secs as i64, nanos.min(999_999_999)).single()
        })
    };

    parsed.ok_or_else(|| unparsable("unix timestamp", n))
}

fn from_unix_seconds(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

/// RFC 3339 first, then the naive layouts Python's `fromisoformat` accepts.
pub fn parse_iso8601(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }

    for layout in NAIVE_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Python-style truthiness, used where upstream "present" means non-empty.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn test_int_accepts_numbers_and_numeric_strings() {
        assert_eq!(int(&json!(42)).unwrap(), 42);
        assert_eq!(int(&json!("100")).unwrap(), 100);
        assert_eq!(int(&json!(" 7 ")).unwrap(), 7);
        assert_eq!(int(&json!(3.0)).unwrap(), 3);
    }

    #[test]
    fn test_int_rejects_garbage() {
        assert!(matches!(
            int(&json!("nope")),
            Err(CoerceError::Unparsable { .. })
        ));
        assert!(int(&json!(2.5)).is_err());
        assert!(int(&json!(1e20)).is_err());
        assert!(int(&json!(-1e19)).is_err());
        assert_eq!(int(&json!(-4.0)).unwrap(), -4);
        assert_eq!(int(&Value::Null), Err(CoerceError::Missing));
        assert!(matches!(int(&json!([1])), Err(CoerceError::WrongType { .. })));
    }

    #[test]
    fn test_float_parses_strings() {
        assert_eq!(float(&json!("52.52")).unwrap(), 52.52);
        assert_eq!(float(&json!(13)).unwrap(), 13.0);
        assert!(float(&json!("north")).is_err());
        assert!(float(&json!("NaN")).is_err());
    }

    #[test]
    fn test_boolean_rules() {
        assert!(boolean(&json!("True")).unwrap());
        assert!(boolean(&json!("YES")).unwrap());
        assert!(boolean(&json!("1")).unwrap());
        assert!(!boolean(&json!("0")).unwrap());
        assert!(!boolean(&json!("false")).unwrap());
        assert!(!boolean(&json!("maybe")).unwrap());
        assert!(boolean(&json!(1)).unwrap());
        assert!(boolean(&json!(-3)).unwrap());
        assert!(!boolean(&json!(0)).unwrap());
        assert!(boolean(&json!(true)).unwrap());
    }

    #[test]
    fn test_string_renders_numbers() {
        assert_eq!(string(&json!(12345)).unwrap(), "12345");
        assert_eq!(string(&json!("abc")).unwrap(), "abc");
        assert!(string(&json!({"a": 1})).is_err());
        assert_eq!(non_empty_string(&json!("")), Err(CoerceError::Empty));
    }

    #[test]
    fn test_string_list_null_is_empty() {
        assert!(string_list(&Value::Null).unwrap().is_empty());
        assert_eq!(
            string_list(&json!(["a", "b"])).unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(string_list(&json!("a")).is_err());
    }

    #[test]
    fn test_timestamp_from_unix_and_iso() {
        let epoch = timestamp(&json!(0)).unwrap();
        assert_eq!(epoch.year(), 1970);

        let iso = timestamp(&json!("2024-01-02T03:04:05")).unwrap();
        assert_eq!((iso.year(), iso.month(), iso.day()), (2024, 1, 2));
        assert_eq!(iso.hour(), 3);

        let offset = timestamp(&json!("2024-01-02T03:04:05+02:00")).unwrap();
        assert_eq!(offset.hour(), 1);

        let fractional = timestamp(&json!("2024-01-02T03:04:05.123456")).unwrap();
        assert_eq!(fractional.second(), 5);

        let date_only = timestamp(&json!("2023-06-30")).unwrap();
        assert_eq!(date_only.day(), 30);

        let float_secs = timestamp(&json!(1.5)).unwrap();
        assert_eq!(float_secs.timestamp_millis(), 1500);
    }

    #[test]
    fn test_timestamp_rejects_garbage() {
        assert!(timestamp(&json!("not-a-date")).is_err());
        assert!(timestamp(&json!(true)).is_err());
    }

    #[test]
    fn test_unix_timestamp_refuses_iso_text() {
        assert_eq!(unix_timestamp(&json!("86400")).unwrap().day(), 2);
        assert!(unix_timestamp(&json!(86400)).is_ok());
        assert!(unix_timestamp(&json!("2024-01-02T03:04:05")).is_err());
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!({})));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(is_truthy(&json!({"id": "1"})));
    }
}

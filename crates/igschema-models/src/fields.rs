//! Declared-field reader used by every entity's `validate`.
//!
//! An entity reads its fields one call at a time, in declaration order; the
//! name passed in is the allow-list entry and the method picks the coercer
//! and failure policy. Undeclared keys in the payload are never looked at.
//! Issues are collected instead of returned so that a rejected entity
//! reports every offending field at once.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::coerce::{self, kind_of};
use crate::error::{CoerceError, FieldIssue, ValidationError};
use crate::naming::{to_camel, INTERNAL_ID, STORAGE_ID};

/// A JSON object as handed to `validate`.
pub type Object = Map<String, Value>;

pub(crate) struct FieldReader<'a> {
    entity: &'static str,
    doc: &'a Object,
    issues: Vec<FieldIssue>,
}

impl<'a> FieldReader<'a> {
    pub fn new(entity: &'static str, doc: &'a Object) -> Self {
        Self {
            entity,
            doc,
            issues: Vec::new(),
        }
    }

    /// Raw value under `name`, its camelCase spelling, or `_id` for the
    /// identifier. Explicit `null` counts as absent.
    pub fn raw(&self, name: &str) -> Option<&'a Value> {
        let doc = self.doc;
        let found = doc.get(name).filter(|v| !v.is_null());
        if found.is_some() {
            return found;
        }

        let camel = to_camel(name);
        if camel != name {
            if let Some(v) = doc.get(&camel).filter(|v| !v.is_null()) {
                return Some(v);
            }
        }

        if name == INTERNAL_ID {
            return doc.get(STORAGE_ID).filter(|v| !v.is_null());
        }

        None
    }

    pub fn issue(&mut self, field: impl Into<String>, reason: impl ToString) {
        self.issues.push(FieldIssue {
            field: field.into(),
            reason: reason.to_string(),
        });
    }

    /// Absent or uncoercible → issue.
    pub fn required<T: Default>(
        &mut self,
        name: &str,
        coerce: impl FnOnce(&Value) -> Result<T, CoerceError>,
    ) -> T {
        match self.raw(name).map(coerce) {
            Some(Ok(v)) => v,
            Some(Err(e)) => {
                self.issue(name, e);
                T::default()
            }
            None => {
                self.issue(name, CoerceError::Missing);
                T::default()
            }
        }
    }

    /// Absent → `None`; present but uncoercible → issue.
    fn optional_strict<T>(
        &mut self,
        name: &str,
        coerce: impl FnOnce(&Value) -> Result<T, CoerceError>,
    ) -> Option<T> {
        match self.raw(name).map(coerce)? {
            Ok(v) => Some(v),
            Err(e) => {
                self.issue(name, e);
                None
            }
        }
    }

    /// Absent or uncoercible → `None`, never an issue.
    fn optional_soft<T>(
        &self,
        name: &str,
        coerce: impl FnOnce(&Value) -> Result<T, CoerceError>,
    ) -> Option<T> {
        self.raw(name).and_then(|v| coerce(v).ok())
    }

    pub fn required_string(&mut self, name: &str) -> String {
        self.required(name, coerce::string)
    }

    pub fn required_non_empty(&mut self, name: &str) -> String {
        match self.raw(name) {
            // Explicit null on a required identifier reads as empty, not missing.
            None if self.doc.contains_key(name) => {
                self.issue(name, CoerceError::Empty);
                String::new()
            }
            _ => self.required(name, coerce::non_empty_string),
        }
    }

    pub fn string_or(&mut self, name: &str, default: &str) -> String {
        self.optional_strict(name, coerce::string)
            .unwrap_or_else(|| default.to_string())
    }

    pub fn optional_string(&self, name: &str) -> Option<String> {
        self.optional_soft(name, coerce::string)
    }

    pub fn required_int(&mut self, name: &str) -> i64 {
        self.required(name, coerce::int)
    }

    /// Present values must coerce; absent falls back to `default`.
    pub fn int_or(&mut self, name: &str, default: i64) -> i64 {
        self.optional_strict(name, coerce::int).unwrap_or(default)
    }

    pub fn optional_int(&self, name: &str) -> Option<i64> {
        self.optional_soft(name, coerce::int)
    }

    pub fn required_float(&mut self, name: &str) -> f64 {
        self.required(name, coerce::float)
    }

    pub fn optional_float(&self, name: &str) -> Option<f64> {
        self.optional_soft(name, coerce::float)
    }

    pub fn optional_bool(&self, name: &str) -> Option<bool> {
        self.optional_soft(name, coerce::boolean)
    }

    pub fn required_timestamp(&mut self, name: &str) -> DateTime<Utc> {
        self.required(name, coerce::timestamp)
    }

    pub fn required_unix_timestamp(&mut self, name: &str) -> DateTime<Utc> {
        self.required(name, coerce::unix_timestamp)
    }

    /// Absent is fine, garbage rejects.
    pub fn optional_timestamp(&mut self, name: &str) -> Option<DateTime<Utc>> {
        self.optional_strict(name, coerce::timestamp)
    }

    /// Absent or garbage both read as `None`.
    pub fn lenient_timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        self.optional_soft(name, coerce::timestamp)
    }

    /// Ingestion-time fields: default to now, garbage rejects.
    pub fn timestamp_or_now(&mut self, name: &str) -> DateTime<Utc> {
        self.optional_strict(name, coerce::timestamp)
            .unwrap_or_else(Utc::now)
    }

    pub fn string_list(&mut self, name: &str) -> Vec<String> {
        self.optional_strict(name, coerce::string_list)
            .unwrap_or_default()
    }

    /// Free-form list of upstream objects kept as JSON; `null` → empty.
    pub fn json_list(&mut self, name: &str) -> Vec<Value> {
        match self.raw(name) {
            None => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(other) => {
                self.issue(name, wrong_type("array", other));
                Vec::new()
            }
        }
    }

    /// Free-form upstream object kept as JSON.
    pub fn json_object(&mut self, name: &str) -> Option<Object> {
        match self.raw(name)? {
            Value::Object(map) => Some(map.clone()),
            other => {
                self.issue(name, wrong_type("object", other));
                None
            }
        }
    }

    /// Nested entity, absent allowed. Its issues are re-rooted under `name`.
    pub fn entity<T>(
        &mut self,
        name: &str,
        validate: impl FnOnce(&Object) -> Result<T, ValidationError>,
    ) -> Option<T> {
        match self.raw(name)? {
            Value::Object(map) => match validate(map) {
                Ok(v) => Some(v),
                Err(e) => {
                    self.issues.extend(e.prefixed(name));
                    None
                }
            },
            other => {
                self.issue(name, wrong_type("object", other));
                None
            }
        }
    }

    pub fn required_entity<T>(
        &mut self,
        name: &str,
        validate: impl FnOnce(&Object) -> Result<T, ValidationError>,
    ) -> Option<T> {
        if self.raw(name).is_none() {
            self.issue(name, CoerceError::Missing);
            return None;
        }
        self.entity(name, validate)
    }

    /// Sequence of nested entities; `null` → empty. Every element is
    /// validated and failures are reported as `name[i].field`.
    pub fn entities<T>(
        &mut self,
        name: &str,
        validate: impl Fn(&Object) -> Result<T, ValidationError>,
    ) -> Vec<T> {
        let items = match self.raw(name) {
            None => return Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => {
                self.issue(name, wrong_type("array", other));
                return Vec::new();
            }
        };

        let mut out = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            let path = format!("{name}[{idx}]");
            match item {
                Value::Object(map) => match validate(map) {
                    Ok(v) => out.push(v),
                    Err(e) => self.issues.extend(e.prefixed(&path)),
                },
                other => self.issue(path, wrong_type("object", other)),
            }
        }
        out
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.entity, self.issues))
        }
    }
}

fn wrong_type(expected: &'static str, value: &Value) -> CoerceError {
    CoerceError::WrongType {
        expected,
        found: kind_of(value),
    }
}

/// Borrow `value` as an object or reject the whole entity.
pub(crate) fn as_object<'v>(
    entity: &'static str,
    value: &'v Value,
) -> Result<&'v Object, ValidationError> {
    value
        .as_object()
        .ok_or_else(|| ValidationError::single(entity, "", wrong_type("object", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Object {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_raw_accepts_snake_camel_and_storage_id() {
        let doc = obj(json!({"_id": "1", "fullName": "A", "media_count": null}));
        let r = FieldReader::new("sample", &doc);
        assert_eq!(r.raw("id"), Some(&json!("1")));
        assert_eq!(r.raw("full_name"), Some(&json!("A")));
        assert_eq!(r.raw("media_count"), None);
    }

    #[test]
    fn test_collects_every_issue() {
        let doc = obj(json!({"count": "x", "when": "never"}));
        let mut r = FieldReader::new("sample", &doc);
        r.required_string("id");
        r.required_int("count");
        r.optional_timestamp("when");
        let err = r.finish().unwrap_err();
        assert_eq!(err.issues.len(), 3);
        assert!(err.has_issue("id"));
        assert!(err.has_issue("count"));
        assert!(err.has_issue("when"));
    }

    #[test]
    fn test_soft_fields_never_raise() {
        let doc = obj(json!({"lat": "north", "media_count": "many", "flag": "yes"}));
        let r = FieldReader::new("sample", &doc);
        assert_eq!(r.optional_float("lat"), None);
        assert_eq!(r.optional_int("media_count"), None);
        assert_eq!(r.optional_bool("flag"), Some(true));
        assert!(r.finish().is_ok());
    }

    #[test]
    fn test_null_lists_become_empty() {
        let doc = obj(json!({"tags": null, "links": null}));
        let mut r = FieldReader::new("sample", &doc);
        assert!(r.string_list("tags").is_empty());
        assert!(r.json_list("links").is_empty());
        assert!(r.finish().is_ok());
    }

    #[test]
    fn test_entities_report_indexed_paths() {
        let doc = obj(json!({"items": [{"n": 1}, {"n": "bad"}, 3]}));
        let mut r = FieldReader::new("sample", &doc);
        let items = r.entities("items", |m| {
            let mut inner = FieldReader::new("item", m);
            let n = inner.required_int("n");
            inner.finish().map(|_| n)
        });
        assert_eq!(items, vec![1]);
        let err = r.finish().unwrap_err();
        assert!(err.has_issue("items[1].n"));
        assert!(err.has_issue("items[2]"));
    }
}

//! Storage boundary: entity ⇄ persisted document.
//!
//! Entities derive `Serialize` with `rename_all = "camelCase"` and rename
//! their `id` to `_id`, so `serde_json::to_value` already yields the stored
//! shape. This module adds the sparse mode and the way back in.
//!
//! Free-form upstream JSON kept on an entity (`#[serde(serialize_with =
//! "opaque")]`) is written verbatim: sparse mode never looks inside it.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::fields::{as_object, Object};

/// Wrapper key marking an opaque field until `to_document` unwraps it.
const OPAQUE_KEY: &str = "$opaque";

/// How absent fields are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentMode {
    /// Drop absent entity fields, at every depth of the typed structure.
    #[default]
    Sparse,
    /// Keep absent fields as explicit `null`.
    Full,
}

/// A validated entity that can be stored and reconstructed.
///
/// Always store through `to_document`; serializing an entity directly
/// leaves its opaque fields wrapped.
pub trait Document: Serialize + Sized {
    /// Entity name used in validation errors.
    const KIND: &'static str;

    /// Canonical validation entry point. Accepts snake_case or camelCase
    /// keys and `id` or `_id` for identifiers.
    fn validate(doc: &Object) -> Result<Self, ValidationError>;

    fn validate_value(value: &Value) -> Result<Self, ValidationError> {
        Self::validate(as_object(Self::KIND, value)?)
    }

    /// The literal persisted-document shape.
    fn to_document(&self, mode: DocumentMode) -> Result<Map<String, Value>, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        settle(&mut value, mode);
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(<serde_json::Error as serde::ser::Error>::custom(format!(
                "{} did not serialize to an object",
                Self::KIND
            ))),
        }
    }

    /// Rebuild an entity from a stored document through `validate`, which
    /// already reads `_id` as `id`.
    fn from_document(doc: &Map<String, Value>) -> Result<Self, ValidationError> {
        Self::validate(doc)
    }
}

/// `serialize_with` target for upstream JSON stored as-is.
pub(crate) fn opaque<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(OPAQUE_KEY, value)?;
    map.end()
}

/// Unwrap opaque fields and, in sparse mode, drop `null` members of the
/// typed structure around them.
fn settle(value: &mut Value, mode: DocumentMode) {
    match value {
        Value::Object(map) => {
            for member in map.values_mut() {
                match take_opaque(member) {
                    Some(inner) => *member = inner,
                    None => settle(member, mode),
                }
            }
            if mode == DocumentMode::Sparse {
                map.retain(|_, v| !v.is_null());
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|item| settle(item, mode)),
        _ => {}
    }
}

fn take_opaque(value: &mut Value) -> Option<Value> {
    match value {
        Value::Object(map) if map.len() == 1 => map.remove(OPAQUE_KEY),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Inner {
        #[serde(rename = "_id")]
        id: Option<String>,
        note: Option<String>,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Outer {
        inner: Inner,
        items: Vec<Inner>,
        #[serde(serialize_with = "opaque")]
        extra: Vec<Value>,
        #[serde(serialize_with = "opaque")]
        missing: Option<Object>,
    }

    impl Document for Outer {
        const KIND: &'static str = "outer";

        fn validate(_: &Object) -> Result<Self, ValidationError> {
            unreachable!()
        }
    }

    fn outer() -> Outer {
        Outer {
            inner: Inner { id: Some("i".into()), note: None },
            items: vec![Inner { id: None, note: Some("n".into()) }],
            extra: vec![json!({"_id": "x", "gone": null})],
            missing: None,
        }
    }

    #[test]
    fn test_sparse_drops_absent_typed_fields_only() {
        let doc = outer().to_document(DocumentMode::Sparse).unwrap();
        assert_eq!(
            Value::Object(doc),
            json!({
                "inner": {"_id": "i"},
                "items": [{"note": "n"}],
                "extra": [{"_id": "x", "gone": null}],
            })
        );
    }

    #[test]
    fn test_full_keeps_nulls_and_unwraps_opaque() {
        let doc = outer().to_document(DocumentMode::Full).unwrap();
        assert_eq!(doc["inner"], json!({"_id": "i", "note": null}));
        assert_eq!(doc["extra"], json!([{"_id": "x", "gone": null}]));
        assert_eq!(doc.get("missing"), Some(&Value::Null));
    }
}

use serde::Serialize;
use serde_json::Value;

use crate::document::Document;
use crate::error::ValidationError;
use crate::fields::{FieldReader, Object};

/// Minimal user identity embedded wherever something references an author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCore {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub full_name: String,
}

impl UserCore {
    pub fn from_api_response(data: &Value) -> Result<Self, ValidationError> {
        Self::validate_value(data)
    }

    pub(crate) fn read(r: &mut FieldReader<'_>) -> Self {
        Self {
            id: r.required_non_empty("id"),
            username: r.required_non_empty("username"),
            full_name: r.string_or("full_name", ""),
        }
    }
}

impl Document for UserCore {
    const KIND: &'static str = "user";

    fn validate(doc: &Object) -> Result<Self, ValidationError> {
        let mut r = FieldReader::new(Self::KIND, doc);
        let core = Self::read(&mut r);
        r.finish()?;
        Ok(core)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentMode;
    use serde_json::json;

    #[test]
    fn test_validation_success() {
        let user = UserCore::from_api_response(&json!({
            "id": "123",
            "username": "testuser",
            "full_name": "Test User",
        }))
        .unwrap();

        assert_eq!(user.id, "123");
        assert_eq!(user.username, "testuser");
        assert_eq!(user.full_name, "Test User");
    }

    #[test]
    fn test_full_name_defaults_to_empty() {
        let user = UserCore::from_api_response(&json!({"id": 7, "username": "u"})).unwrap();
        assert_eq!(user.id, "7");
        assert_eq!(user.full_name, "");
    }

    #[test]
    fn test_empty_or_missing_identity_rejects() {
        for payload in [
            json!({"id": "123", "username": ""}),
            json!({"id": "", "username": "x"}),
            json!({"id": null, "username": "x", "full_name": ""}),
            json!({"username": "x"}),
            json!({"id": "1"}),
            json!({}),
        ] {
            assert!(UserCore::from_api_response(&payload).is_err(), "{payload}");
        }
    }

    #[test]
    fn test_reports_both_fields() {
        let err = UserCore::from_api_response(&json!({})).unwrap_err();
        assert!(err.has_issue("id"));
        assert!(err.has_issue("username"));
    }

    #[test]
    fn test_non_object_rejects() {
        assert!(UserCore::from_api_response(&json!("123")).is_err());
    }

    #[test]
    fn test_storage_roundtrip() {
        let user = UserCore::from_api_response(&json!({
            "id": "123", "username": "test", "full_name": "T", "ignored": true
        }))
        .unwrap();

        let doc = user.to_document(DocumentMode::Sparse).unwrap();
        assert_eq!(doc.get("_id"), Some(&json!("123")));
        assert!(!doc.contains_key("id"));
        assert!(!doc.contains_key("ignored"));
        assert_eq!(doc.get("fullName"), Some(&json!("T")));

        let restored = UserCore::from_document(&doc).unwrap();
        assert_eq!(restored, user);
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::document::Document;
use crate::error::ValidationError;
use crate::fields::{FieldReader, Object};

/// Caption attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Caption {
    pub r#type: Option<i64>,
    pub text: Option<String>,
    /// Unparsable timestamps read as absent rather than rejecting the post.
    pub created_at: Option<DateTime<Utc>>,
    pub created_at_utc: Option<DateTime<Utc>>,
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
}

impl Caption {
    pub fn from_api_response(data: &Value) -> Result<Self, ValidationError> {
        Self::validate_value(data)
    }
}

impl Document for Caption {
    const KIND: &'static str = "caption";

    fn validate(doc: &Object) -> Result<Self, ValidationError> {
        let mut r = FieldReader::new(Self::KIND, doc);
        let caption = Self {
            r#type: r.optional_int("type"),
            text: r.optional_string("text"),
            created_at: r.lenient_timestamp("created_at"),
            created_at_utc: r.lenient_timestamp("created_at_utc"),
            hashtags: r.string_list("hashtags"),
            mentions: r.string_list("mentions"),
        };
        r.finish()?;
        Ok(caption)
    }
}

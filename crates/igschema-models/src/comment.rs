//! Comments and their replies.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::document::Document;
use crate::error::ValidationError;
use crate::fields::{as_object, FieldReader, Object};
use crate::identity::UserCore;

/// Fields shared by top-level comments and replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentBody {
    #[serde(rename = "_id")]
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub user: UserCore,
    pub text: String,
    pub like_count: Option<i64>,
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl CommentBody {
    /// Upstream names the like counter `comment_like_count`, and may omit
    /// the text of sticker-only comments.
    fn adapt(data: &Object) -> Object {
        let mut doc = data.clone();
        doc.entry("text").or_insert_with(|| Value::from(""));
        if let Some(likes) = doc.remove("comment_like_count") {
            doc.insert("like_count".into(), likes);
        }
        doc
    }

    fn read(r: &mut FieldReader<'_>) -> Self {
        Self {
            id: r.required_string("id"),
            created_at: r.required_timestamp("created_at"),
            user: r
                .required_entity("user", UserCore::validate)
                .unwrap_or_default(),
            text: r.required_string("text"),
            like_count: r.optional_int("like_count"),
            hashtags: r.string_list("hashtags"),
            mentions: r.string_list("mentions"),
            timestamp: r.timestamp_or_now("timestamp"),
        }
    }
}

/// A reply under a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentReply {
    #[serde(flatten)]
    pub body: CommentBody,
}

impl CommentReply {
    pub fn from_api_response(data: &Value) -> Result<Self, ValidationError> {
        let data = as_object(Self::KIND, data)?;
        Self::validate(&CommentBody::adapt(data))
    }
}

impl Document for CommentReply {
    const KIND: &'static str = "comment reply";

    fn validate(doc: &Object) -> Result<Self, ValidationError> {
        let mut r = FieldReader::new(Self::KIND, doc);
        let body = CommentBody::read(&mut r);
        r.finish()?;
        Ok(Self { body })
    }
}

/// A top-level comment on a post, linked back by the post's shortcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(flatten)]
    pub body: CommentBody,
    pub post_code: String,
    pub did_report_as_spam: Option<bool>,
    pub replies_count: Option<i64>,
    pub replies: Vec<CommentReply>,
}

impl Comment {
    pub fn from_api_response(data: &Value, post_code: &str) -> Result<Self, ValidationError> {
        let data = as_object(Self::KIND, data)?;
        let mut doc = CommentBody::adapt(data);

        doc.insert("post_code".into(), Value::from(post_code));
        doc.insert(
            "replies_count".into(),
            data.get("child_comment_count")
                .cloned()
                .unwrap_or(Value::from(0)),
        );

        let replies = data
            .get("replies")
            .filter(|v| !v.is_null())
            .or_else(|| data.get("preview_child_comments"));
        if let Some(Value::Array(replies)) = replies {
            let adapted = replies
                .iter()
                .map(|reply| match reply {
                    Value::Object(r) => Value::Object(CommentBody::adapt(r)),
                    other => other.clone(),
                })
                .collect();
            doc.insert("replies".into(), Value::Array(adapted));
        }

        Self::validate(&doc)
    }
}

impl Document for Comment {
    const KIND: &'static str = "comment";

    fn validate(doc: &Object) -> Result<Self, ValidationError> {
        let mut r = FieldReader::new(Self::KIND, doc);
        let comment = Self {
            body: CommentBody::read(&mut r),
            post_code: r.required_string("post_code"),
            did_report_as_spam: r.optional_bool("did_report_as_spam"),
            replies_count: r.optional_int("replies_count"),
            replies: r.entities("replies", CommentReply::validate),
        };
        r.finish()?;
        Ok(comment)
    }
}

//! Feed posts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::adapter::{drop_if_empty, synthesize_flat_media};
use crate::caption::Caption;
use crate::coerce;
use crate::document::{opaque, Document};
use crate::error::ValidationError;
use crate::fields::{as_object, FieldReader, Object};
use crate::identity::UserCore;
use crate::location::Location;
use crate::media::{Media, MediaKind};
use crate::metrics::{MetricsHistory, PostMetrics};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub model_type: &'static str,
    #[serde(rename = "_id")]
    pub id: String,
    /// Shortcode used in public URLs.
    pub code: String,
    pub taken_at: DateTime<Utc>,
    pub taken_at_date: Option<DateTime<Utc>>,

    pub caption: Option<Caption>,
    pub accessibility_caption: Option<String>,
    pub caption_is_edited: Option<bool>,

    pub media_type: MediaKind,
    pub media_format: Option<String>,
    pub media_name: Option<String>,
    pub product_type: Option<String>,
    /// Top-level item first, then carousel slides in upstream order.
    pub media: Vec<Media>,

    metrics: MetricsHistory<PostMetrics>,

    pub user: UserCore,
    pub location: Option<Location>,

    pub is_video: bool,
    pub is_private: Option<bool>,
    pub is_paid_partnership: Option<bool>,
    pub is_pinned: Option<bool>,
    pub has_liked: Option<bool>,
    pub has_viewed: Option<bool>,
    pub can_reply: Option<bool>,
    pub can_reshare: Option<bool>,
    pub can_save: Option<bool>,

    pub comments_disabled: Option<bool>,
    #[serde(serialize_with = "opaque")]
    pub preview_comments: Vec<Value>,

    pub filter_type: Option<i64>,
    pub device_timestamp: Option<i64>,
    #[serde(serialize_with = "opaque")]
    pub fb_user_tags: Option<Object>,
    #[serde(serialize_with = "opaque")]
    pub tagged_users: Vec<Value>,

    pub has_shared_to_fb: Option<i64>,
    pub fbid: Option<String>,

    pub deleted_reason: Option<i64>,
    pub fb_aggregated_comment_count: Option<i64>,
    pub fb_aggregated_like_count: Option<i64>,
    #[serde(serialize_with = "opaque")]
    pub fundraiser_tag: Option<Object>,
    #[serde(serialize_with = "opaque")]
    pub gen_ai_detection_method: Option<Object>,
    pub has_high_risk_gen_ai_inform_treatment: Option<bool>,
    pub integrity_review_decision: Option<String>,
    #[serde(serialize_with = "opaque")]
    pub invited_coauthor_producers: Vec<Value>,
    pub is_quiet_post: Option<bool>,

    pub coauthor_producer_can_see_organic_insights: Option<bool>,
    #[serde(serialize_with = "opaque")]
    pub coauthor_producers: Vec<Value>,
    #[serde(serialize_with = "opaque")]
    pub comment_inform_treatment: Option<Object>,

    /// Ingestion time.
    pub timestamp: DateTime<Utc>,
}

impl Post {
    pub const MODEL_TYPE: &'static str = "post";

    pub fn from_api_response(data: &Value) -> Result<Self, ValidationError> {
        let data = as_object(Self::KIND, data)?;
        let doc = Self::adapt(data);
        let mut post = Self::validate(&doc)?;

        if let Some(Value::Object(block)) = data.get("metrics").filter(|v| coerce::is_truthy(v)) {
            if let Some(snapshot) = PostMetrics::try_coerce(block) {
                post.add_metrics(snapshot);
            }
        }

        Ok(post)
    }

    fn adapt(data: &Object) -> Object {
        let mut doc = data.clone();
        doc.remove("metrics");
        drop_if_empty(&mut doc, "caption");
        drop_if_empty(&mut doc, "location");

        if !doc.get("gen_ai_detection_method").is_some_and(is_non_empty_object) {
            doc.remove("gen_ai_detection_method");
        }

        let mut media = Vec::new();
        if let Some(item) = synthesize_flat_media(data, "0") {
            media.push(Value::Object(item));
        }
        if let Some(Value::Array(slides)) = data.get("carousel_media") {
            for (idx, slide) in slides.iter().enumerate() {
                match slide {
                    Value::Object(s) => {
                        let mut s = s.clone();
                        s.entry("id")
                            .or_insert_with(|| Value::String(format!("carousel_item_{idx}")));
                        media.push(Value::Object(Media::adapt(&s)));
                    }
                    other => media.push(other.clone()),
                }
            }
        }
        doc.insert("media".into(), Value::Array(media));
        doc
    }

    pub fn add_metrics(&mut self, snapshot: PostMetrics) {
        self.metrics.push(snapshot);
    }

    pub fn get_latest_metrics(&self) -> Option<&PostMetrics> {
        self.metrics.latest()
    }

    pub fn get_metrics_history(&self) -> Vec<&PostMetrics> {
        self.metrics.history()
    }

    pub fn metrics(&self) -> &MetricsHistory<PostMetrics> {
        &self.metrics
    }

    pub fn like_count(&self) -> Option<i64> {
        self.get_latest_metrics().and_then(|m| m.like_count)
    }

    pub fn comment_count(&self) -> Option<i64> {
        self.get_latest_metrics().and_then(|m| m.comment_count)
    }

    pub fn view_count(&self) -> Option<i64> {
        self.get_latest_metrics().and_then(|m| m.view_count)
    }

    pub fn play_count(&self) -> Option<i64> {
        self.get_latest_metrics().and_then(|m| m.play_count)
    }

    pub fn fb_like_count(&self) -> Option<i64> {
        self.get_latest_metrics().and_then(|m| m.fb_like_count)
    }

    pub fn fb_play_count(&self) -> Option<i64> {
        self.get_latest_metrics().and_then(|m| m.fb_play_count)
    }
}

fn is_non_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(|m| !m.is_empty())
}

impl Document for Post {
    const KIND: &'static str = "post";

    fn validate(doc: &Object) -> Result<Self, ValidationError> {
        let mut r = FieldReader::new(Self::KIND, doc);

        let taken_at = r.required_timestamp("taken_at");
        let media_type = r.required("media_type", MediaKind::coerce);

        let post = Self {
            model_type: Self::MODEL_TYPE,
            id: r.required_string("id"),
            code: r.required_string("code"),
            taken_at,
            taken_at_date: r.lenient_timestamp("taken_at_date").or(Some(taken_at)),
            caption: r.entity("caption", Caption::validate),
            accessibility_caption: r.optional_string("accessibility_caption"),
            caption_is_edited: r.optional_bool("caption_is_edited"),
            media_type,
            media_format: r.optional_string("media_format"),
            media_name: r.optional_string("media_name"),
            product_type: r.optional_string("product_type"),
            media: r.entities("media", Media::validate),
            metrics: r
                .entities("metrics", PostMetrics::validate)
                .into_iter()
                .collect(),
            user: r
                .required_entity("user", UserCore::validate)
                .unwrap_or_default(),
            location: r.entity("location", Location::validate),
            is_video: media_type == MediaKind::Video,
            is_private: r.optional_bool("is_private"),
            is_paid_partnership: r.optional_bool("is_paid_partnership"),
            is_pinned: r.optional_bool("is_pinned"),
            has_liked: r.optional_bool("has_liked"),
            has_viewed: r.optional_bool("has_viewed"),
            can_reply: r.optional_bool("can_reply"),
            can_reshare: r.optional_bool("can_reshare"),
            can_save: r.optional_bool("can_save"),
            comments_disabled: r.optional_bool("comments_disabled"),
            preview_comments: r.json_list("preview_comments"),
            filter_type: r.optional_int("filter_type"),
            device_timestamp: r.optional_int("device_timestamp"),
            fb_user_tags: r.json_object("fb_user_tags"),
            tagged_users: r.json_list("tagged_users"),
            has_shared_to_fb: r.optional_int("has_shared_to_fb"),
            fbid: r.optional_string("fbid"),
            deleted_reason: r.optional_int("deleted_reason"),
            fb_aggregated_comment_count: r.optional_int("fb_aggregated_comment_count"),
            fb_aggregated_like_count: r.optional_int("fb_aggregated_like_count"),
            fundraiser_tag: r.json_object("fundraiser_tag"),
            gen_ai_detection_method: r.json_object("gen_ai_detection_method"),
            has_high_risk_gen_ai_inform_treatment: r
                .optional_bool("has_high_risk_gen_ai_inform_treatment"),
            integrity_review_decision: r.optional_string("integrity_review_decision"),
            invited_coauthor_producers: r.json_list("invited_coauthor_producers"),
            is_quiet_post: r.optional_bool("is_quiet_post"),
            coauthor_producer_can_see_organic_insights: r
                .optional_bool("coauthor_producer_can_see_organic_insights"),
            coauthor_producers: r.json_list("coauthor_producers"),
            comment_inform_treatment: r.json_object("comment_inform_treatment"),
            timestamp: r.timestamp_or_now("timestamp"),
        };
        r.finish()?;
        Ok(post)
    }
}

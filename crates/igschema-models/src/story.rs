//! Stories: single items, their mention stickers, and the per-user container.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::adapter::{adapt_batch, drop_if_empty, synthesize_flat_media, BatchMode};
use crate::coerce;
use crate::document::{opaque, Document};
use crate::error::ValidationError;
use crate::fields::{as_object, FieldReader, Object};
use crate::identity::UserCore;
use crate::location::Location;
use crate::media::{Media, MediaKind};

// ---------------------------------------------------------------------------
// Mentions
// ---------------------------------------------------------------------------

/// A user mention sticker placed on a story item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryMention {
    pub user: UserCore,
    pub display_type: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<i64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
    pub start_time_ms: Option<i64>,
    pub end_time_ms: Option<i64>,
    pub is_pinned: Option<bool>,
    pub is_hidden: Option<bool>,
    pub is_sticker: Option<bool>,
    pub is_fb_sticker: Option<bool>,
}

impl StoryMention {
    pub fn from_api_response(data: &Value) -> Result<Self, ValidationError> {
        Self::validate_value(data)
    }

    /// Invalid mentions are always dropped.
    pub fn from_api_response_items(items: &[Value]) -> Vec<Self> {
        items
            .iter()
            .filter_map(|item| Self::from_api_response(item).ok())
            .collect()
    }
}

impl Document for StoryMention {
    const KIND: &'static str = "story mention";

    fn validate(doc: &Object) -> Result<Self, ValidationError> {
        let mut r = FieldReader::new(Self::KIND, doc);
        let mention = Self {
            user: r
                .required_entity("user", UserCore::validate)
                .unwrap_or_default(),
            display_type: r.optional_string("display_type"),
            x: r.optional_float("x"),
            y: r.optional_float("y"),
            z: r.optional_int("z"),
            width: r.optional_float("width"),
            height: r.optional_float("height"),
            rotation: r.optional_float("rotation"),
            start_time_ms: r.optional_int("start_time_ms"),
            end_time_ms: r.optional_int("end_time_ms"),
            is_pinned: r.optional_bool("is_pinned"),
            is_hidden: r.optional_bool("is_hidden"),
            is_sticker: r.optional_bool("is_sticker"),
            is_fb_sticker: r.optional_bool("is_fb_sticker"),
        };
        r.finish()?;
        Ok(mention)
    }
}

// ---------------------------------------------------------------------------
// Story items
// ---------------------------------------------------------------------------

/// One story frame. Always carries exactly one media item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub code: String,
    /// Upstream sends unix seconds only; ISO text is refused on ingestion.
    pub taken_at: DateTime<Utc>,

    pub caption: Option<String>,
    pub caption_is_edited: Option<bool>,

    pub media_type: MediaKind,
    pub media_format: Option<String>,
    pub media_name: Option<String>,
    pub product_type: Option<String>,
    pub media: Media,

    pub user: Option<UserCore>,
    pub owner: Option<UserCore>,
    pub location: Option<Location>,

    pub is_video: bool,
    pub is_private: Option<bool>,
    pub is_paid_partnership: Option<bool>,
    pub is_pinned: Option<bool>,
    pub is_archived: Option<bool>,
    pub is_reel_media: Option<bool>,

    pub has_liked: Option<bool>,
    pub has_privately_liked: Option<bool>,
    pub has_viewed: Option<bool>,
    pub can_reply: Option<bool>,
    pub can_reshare: Option<bool>,
    pub can_save: Option<bool>,
    pub can_hype: Option<bool>,
    pub can_send_prompt: Option<bool>,

    pub reel_mentions: Vec<StoryMention>,
    /// Username of the author of a reshared story.
    pub reshared_story_media_author: Option<String>,

    pub filter_type: Option<i64>,
    pub device_timestamp: Option<i64>,
    #[serde(serialize_with = "opaque")]
    pub tagged_users: Vec<Value>,

    #[serde(serialize_with = "opaque")]
    pub cutout_sticker_info: Vec<Value>,
    #[serde(serialize_with = "opaque")]
    pub video_sticker_locales: Vec<Value>,

    pub fbid: Option<String>,
    #[serde(serialize_with = "opaque")]
    pub crosspost_metadata: Option<Object>,
    #[serde(serialize_with = "opaque")]
    pub sharing_friction_info: Option<Object>,

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
    pub coauthor_producer_can_see_organic_insights: Option<bool>,
    #[serde(serialize_with = "opaque")]
    pub coauthor_producers: Vec<Value>,

    #[serde(serialize_with = "opaque")]
    pub music_metadata: Option<Object>,
    pub can_play_spotify_audio: Option<bool>,
    pub has_audio: Option<bool>,

    pub is_first_take: Option<bool>,
    pub is_quicksnap_recap: Option<bool>,
    pub is_photo_mash_story: Option<bool>,
    pub is_post_live_clips_media: Option<bool>,
    pub is_cutout_sticker_allowed: Option<bool>,
    pub is_comments_gif_composer_enabled: Option<bool>,
    pub is_from_discovery_surface: Option<bool>,
    pub is_in_profile_grid: Option<bool>,
    pub is_open_to_public_submission: Option<bool>,
    pub is_organic_product_tagging_eligible: Option<bool>,
    pub is_reshare_of_text_post_app_media_in_ig: Option<bool>,
    pub is_tagged_media_shared_to_viewer_profile_grid: Option<bool>,
    pub is_terminal_video_segment: Option<bool>,
    pub is_viewer_mentioned: Option<bool>,

    pub like_and_view_counts_disabled: Option<bool>,
    pub supports_reel_reactions: Option<bool>,
    pub archive_story_deletion_ts: Option<i64>,

    pub boost_unavailable_identifier: Option<String>,
    pub boost_unavailable_reason: Option<String>,
    pub boost_unavailable_reason_v2: Option<String>,

    pub shop_routing_user_id: Option<String>,
    #[serde(serialize_with = "opaque")]
    pub product_suggestions: Vec<Value>,
    pub should_show_author_pog_for_tagged_media_shared_to_profile_grid: Option<bool>,
    #[serde(serialize_with = "opaque")]
    pub sponsor_tags: Vec<Value>,

    pub timeline_pinned_user_ids: Vec<String>,
    #[serde(serialize_with = "opaque")]
    pub media_attributions_data: Vec<Value>,
    #[serde(serialize_with = "opaque")]
    pub creative_config: Option<Object>,

    /// Ingestion time.
    pub timestamp: DateTime<Utc>,
}

impl StoryItem {
    pub fn from_api_response(data: &Value) -> Result<Self, ValidationError> {
        let data = as_object(Self::KIND, data)?;
        Self::read(&Self::adapt(data), TakenAt::UnixOnly)
    }

    pub fn from_api_response_items(
        items: &[Value],
        mode: BatchMode,
    ) -> Result<Vec<Self>, ValidationError> {
        adapt_batch(Self::KIND, items, mode, Self::from_api_response)
    }

    fn adapt(data: &Object) -> Object {
        let mut doc = data.clone();
        drop_if_empty(&mut doc, "user");
        drop_if_empty(&mut doc, "owner");
        drop_if_empty(&mut doc, "location");

        match synthesize_flat_media(data, "unknown") {
            Some(media) => {
                doc.insert("media".into(), Value::Object(media));
            }
            None => {
                doc.remove("media");
            }
        }

        let author = data
            .get("reshared_story_media_author")
            .filter(|v| coerce::is_truthy(v));
        if let Some(author) = author {
            let username = author
                .get("username")
                .cloned()
                .unwrap_or_else(|| Value::from(""));
            doc.insert("reshared_story_media_author".into(), username);
        }

        let mentions: Vec<Value> = data
            .get("reel_mentions")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter(|item| StoryMention::from_api_response(item).is_ok())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        doc.insert("reel_mentions".into(), Value::Array(mentions));

        doc
    }

    /// Stand-in media for items with no usable image or video versions.
    fn placeholder_media(r: &FieldReader<'_>, kind: MediaKind) -> Media {
        let id = r
            .raw("id")
            .and_then(|v| coerce::string(v).ok())
            .unwrap_or_else(|| "unknown".to_string());
        Media::placeholder(id, kind)
    }
}

/// Upstream sends `taken_at` as unix seconds only; stored documents carry
/// it as ISO text.
#[derive(Clone, Copy)]
enum TakenAt {
    UnixOnly,
    Any,
}

impl Document for StoryItem {
    const KIND: &'static str = "story item";

    fn validate(doc: &Object) -> Result<Self, ValidationError> {
        Self::read(doc, TakenAt::Any)
    }
}

impl StoryItem {
    fn read(doc: &Object, taken_at: TakenAt) -> Result<Self, ValidationError> {
        let mut r = FieldReader::new(Self::KIND, doc);

        let media_type = r.required("media_type", MediaKind::coerce);
        let media = match r.entity("media", Media::validate) {
            Some(media) => media,
            None => Self::placeholder_media(&r, media_type),
        };

        let item = Self {
            id: r.required_string("id"),
            code: r.required_string("code"),
            taken_at: match taken_at {
                TakenAt::UnixOnly => r.required_unix_timestamp("taken_at"),
                TakenAt::Any => r.required_timestamp("taken_at"),
            },
            caption: r.optional_string("caption"),
            caption_is_edited: r.optional_bool("caption_is_edited"),
            media_type,
            media_format: r.optional_string("media_format"),
            media_name: r.optional_string("media_name"),
            product_type: r.optional_string("product_type"),
            media,
            user: r.entity("user", UserCore::validate),
            owner: r.entity("owner", UserCore::validate),
            location: r.entity("location", Location::validate),
            is_video: media_type == MediaKind::Video,
            is_private: r.optional_bool("is_private"),
            is_paid_partnership: r.optional_bool("is_paid_partnership"),
            is_pinned: r.optional_bool("is_pinned"),
            is_archived: r.optional_bool("is_archived"),
            is_reel_media: r.optional_bool("is_reel_media"),
            has_liked: r.optional_bool("has_liked"),
            has_privately_liked: r.optional_bool("has_privately_liked"),
            has_viewed: r.optional_bool("has_viewed"),
            can_reply: r.optional_bool("can_reply"),
            can_reshare: r.optional_bool("can_reshare"),
            can_save: r.optional_bool("can_save"),
            can_hype: r.optional_bool("can_hype"),
            can_send_prompt: r.optional_bool("can_send_prompt"),
            reel_mentions: r.entities("reel_mentions", StoryMention::validate),
            reshared_story_media_author: r.optional_string("reshared_story_media_author"),
            filter_type: r.optional_int("filter_type"),
            device_timestamp: r.optional_int("device_timestamp"),
            tagged_users: r.json_list("tagged_users"),
            cutout_sticker_info: r.json_list("cutout_sticker_info"),
            video_sticker_locales: r.json_list("video_sticker_locales"),
            fbid: r.optional_string("fbid"),
            crosspost_metadata: r.json_object("crosspost_metadata"),
            sharing_friction_info: r.json_object("sharing_friction_info"),
            deleted_reason: r.optional_int("deleted_reason"),
            fb_aggregated_comment_count: r.optional_int("fb_aggregated_comment_count"),
            fb_aggregated_like_count: r.optional_int("fb_aggregated_like_count"),
            fundraiser_tag: r.json_object("fundraiser_tag"),
            gen_ai_detection_method: r.json_object("gen_ai_detection_method"),
            has_high_risk_gen_ai_inform_treatment: r
                .optional_bool("has_high_risk_gen_ai_inform_treatment"),
            integrity_review_decision: r.optional_string("integrity_review_decision"),
            invited_coauthor_producers: r.json_list("invited_coauthor_producers"),
            coauthor_producer_can_see_organic_insights: r
                .optional_bool("coauthor_producer_can_see_organic_insights"),
            coauthor_producers: r.json_list("coauthor_producers"),
            music_metadata: r.json_object("music_metadata"),
            can_play_spotify_audio: r.optional_bool("can_play_spotify_audio"),
            has_audio: r.optional_bool("has_audio"),
            is_first_take: r.optional_bool("is_first_take"),
            is_quicksnap_recap: r.optional_bool("is_quicksnap_recap"),
            is_photo_mash_story: r.optional_bool("is_photo_mash_story"),
            is_post_live_clips_media: r.optional_bool("is_post_live_clips_media"),
            is_cutout_sticker_allowed: r.optional_bool("is_cutout_sticker_allowed"),
            is_comments_gif_composer_enabled: r.optional_bool("is_comments_gif_composer_enabled"),
            is_from_discovery_surface: r.optional_bool("is_from_discovery_surface"),
            is_in_profile_grid: r.optional_bool("is_in_profile_grid"),
            is_open_to_public_submission: r.optional_bool("is_open_to_public_submission"),
            is_organic_product_tagging_eligible: r
                .optional_bool("is_organic_product_tagging_eligible"),
            is_reshare_of_text_post_app_media_in_ig: r
                .optional_bool("is_reshare_of_text_post_app_media_in_ig"),
            is_tagged_media_shared_to_viewer_profile_grid: r
                .optional_bool("is_tagged_media_shared_to_viewer_profile_grid"),
            is_terminal_video_segment: r.optional_bool("is_terminal_video_segment"),
            is_viewer_mentioned: r.optional_bool("is_viewer_mentioned"),
            like_and_view_counts_disabled: r.optional_bool("like_and_view_counts_disabled"),
            supports_reel_reactions: r.optional_bool("supports_reel_reactions"),
            archive_story_deletion_ts: r.optional_int("archive_story_deletion_ts"),
            boost_unavailable_identifier: r.optional_string("boost_unavailable_identifier"),
            boost_unavailable_reason: r.optional_string("boost_unavailable_reason"),
            boost_unavailable_reason_v2: r.optional_string("boost_unavailable_reason_v2"),
            shop_routing_user_id: r.optional_string("shop_routing_user_id"),
            product_suggestions: r.json_list("product_suggestions"),
            should_show_author_pog_for_tagged_media_shared_to_profile_grid: r
                .optional_bool("should_show_author_pog_for_tagged_media_shared_to_profile_grid"),
            sponsor_tags: r.json_list("sponsor_tags"),
            timeline_pinned_user_ids: r.string_list("timeline_pinned_user_ids"),
            media_attributions_data: r.json_list("media_attributions_data"),
            creative_config: r.json_object("creative_config"),
            timestamp: r.timestamp_or_now("timestamp"),
        };
        r.finish()?;
        Ok(item)
    }
}

// ---------------------------------------------------------------------------
// Container
// ---------------------------------------------------------------------------

/// A user's current story tray. Metadata and items come from separate
/// upstream calls and are joined here.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub model_type: &'static str,
    #[serde(rename = "_id")]
    pub id: String,
    pub user: UserCore,
    pub expiring_at: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
    story_items: Vec<StoryItem>,
}

impl Story {
    pub const MODEL_TYPE: &'static str = "story";

    pub fn from_api_response(
        data: &Value,
        items: &[Value],
        mode: BatchMode,
    ) -> Result<Self, ValidationError> {
        let data = as_object(Self::KIND, data)?;
        let mut doc = data.clone();
        doc.remove("story_items");

        let mut story = Self::validate(&doc)?;
        story.story_items = StoryItem::from_api_response_items(items, mode)?;
        Ok(story)
    }

    pub fn add_story_item(&mut self, item: StoryItem) {
        self.story_items.push(item);
    }

    pub fn story_items(&self) -> &[StoryItem] {
        &self.story_items
    }
}

impl Document for Story {
    const KIND: &'static str = "story";

    fn validate(doc: &Object) -> Result<Self, ValidationError> {
        let mut r = FieldReader::new(Self::KIND, doc);
        let story = Self {
            model_type: Self::MODEL_TYPE,
            id: r.required_string("id"),
            user: r
                .required_entity("user", UserCore::validate)
                .unwrap_or_default(),
            expiring_at: r.required_timestamp("expiring_at"),
            timestamp: r.timestamp_or_now("timestamp"),
            story_items: r.entities("story_items", StoryItem::validate),
        };
        r.finish()?;
        Ok(story)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentMode;
    use serde_json::json;

    fn item(id: &str) -> Value {
        json!({
            "id": id,
            "code": format!("code_{id}"),
            "taken_at": 1_700_000_000,
            "media_type": 1,
            "image_versions": [{"url": format!("https://img/{id}.jpg")}],
            "user": {"id": "u1", "username": "author"},
        })
    }

    #[test]
    fn test_image_item() {
        let story = StoryItem::from_api_response(&item("s1")).unwrap();
        assert_eq!(story.media.kind(), MediaKind::Image);
        assert_eq!(story.media.id.as_deref(), Some("s1"));
        assert_eq!(story.user.as_ref().map(|u| u.username.as_str()), Some("author"));
        assert!(story.owner.is_none());
        assert!(!story.is_video);
    }

    #[test]
    fn test_video_item() {
        let mut payload = item("s2");
        payload["media_type"] = json!(2);
        payload["video_versions"] = json!([{"url": "https://vid/s2.mp4"}]);
        payload["has_audio"] = json!(false);

        let story = StoryItem::from_api_response(&payload).unwrap();
        assert!(story.is_video);
        assert_eq!(story.media.kind(), MediaKind::Video);
        assert_eq!(story.media.has_audio, Some(false));
    }

    #[test]
    fn test_placeholder_media_when_nothing_usable() {
        let mut payload = item("s3");
        payload.as_object_mut().unwrap().remove("image_versions");
        payload["media_type"] = json!(2);

        let story = StoryItem::from_api_response(&payload).unwrap();
        assert_eq!(story.media.id.as_deref(), Some("s3"));
        assert_eq!(story.media.kind(), MediaKind::Video);
        assert!(story.media.versions().is_empty());
    }

    #[test]
    fn test_carousel_code_without_media_survives_storage() {
        let payload = json!({"id": "s1", "code": "c", "taken_at": 1_700_000_000, "media_type": 8});

        let story = StoryItem::from_api_response(&payload).unwrap();
        assert_eq!(story.media_type, MediaKind::Carousel);
        assert_eq!(story.media.kind(), MediaKind::Image);
        assert!(story.media.carousel_media.is_empty());

        let doc = story.to_document(DocumentMode::Sparse).unwrap();
        let restored = StoryItem::from_document(&doc).unwrap();
        assert_eq!(restored, story);
    }

    #[test]
    fn test_upstream_blobs_are_stored_verbatim() {
        let mut payload = item("s7");
        payload["music_metadata"] = json!({"_id": "track", "artist": null});
        payload["sponsor_tags"] = json!([{"_id": "sp1", "permission": null}]);

        let story = StoryItem::from_api_response(&payload).unwrap();
        let doc = story.to_document(DocumentMode::Sparse).unwrap();
        assert_eq!(doc["musicMetadata"], json!({"_id": "track", "artist": null}));
        assert_eq!(doc["sponsorTags"], json!([{"_id": "sp1", "permission": null}]));
        assert!(!doc.contains_key("fundraiserTag"));

        let restored = StoryItem::from_document(&doc).unwrap();
        assert_eq!(restored, story);
    }

    #[test]
    fn test_taken_at_is_unix_only() {
        let mut payload = item("s4");
        payload["taken_at"] = json!("1700000000");
        assert!(StoryItem::from_api_response(&payload).is_ok());

        payload["taken_at"] = json!("2024-01-01T00:00:00");
        let err = StoryItem::from_api_response(&payload).unwrap_err();
        assert!(err.has_issue("taken_at"));
    }

    #[test]
    fn test_empty_user_reads_as_absent() {
        let mut payload = item("s5");
        payload["user"] = json!({});
        payload["owner"] = json!(null);
        let story = StoryItem::from_api_response(&payload).unwrap();
        assert!(story.user.is_none());
        assert!(story.owner.is_none());
    }

    #[test]
    fn test_reshared_author_and_mentions() {
        let mut payload = item("s6");
        payload["reshared_story_media_author"] = json!({"id": "9", "username": "origin"});
        payload["reel_mentions"] = json!([
            {"user": {"id": "m1", "username": "friend"}, "x": "0.5", "is_sticker": 1},
            {"user": {"id": "m2"}},
        ]);

        let story = StoryItem::from_api_response(&payload).unwrap();
        assert_eq!(story.reshared_story_media_author.as_deref(), Some("origin"));
        assert_eq!(story.reel_mentions.len(), 1);
        assert_eq!(story.reel_mentions[0].x, Some(0.5));
        assert_eq!(story.reel_mentions[0].is_sticker, Some(true));
    }

    #[test]
    fn test_mention_items_skip_invalid() {
        let mentions = StoryMention::from_api_response_items(&[
            json!({"user": {"id": "1", "username": "a"}}),
            json!({"user": null}),
            json!("garbage"),
        ]);
        assert_eq!(mentions.len(), 1);
    }

    #[test]
    fn test_item_batch_modes() {
        let items = vec![item("a"), json!({"id": "broken"}), item("b")];

        let lenient = StoryItem::from_api_response_items(&items, BatchMode::SkipInvalid).unwrap();
        let ids: Vec<_> = lenient.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert!(StoryItem::from_api_response_items(&items, BatchMode::Strict).is_err());
    }

    #[test]
    fn test_story_container() {
        let mut story = Story::from_api_response(
            &json!({"id": "st1", "user": {"id": "u1", "username": "author"}, "expiring_at": 1_700_086_400}),
            &[item("a"), item("b")],
            BatchMode::SkipInvalid,
        )
        .unwrap();

        assert_eq!(story.model_type, "story");
        assert_eq!(story.story_items().len(), 2);

        story.add_story_item(StoryItem::from_api_response(&item("c")).unwrap());
        assert_eq!(story.story_items().len(), 3);
    }

    #[test]
    fn test_story_requires_expiry() {
        let err = Story::from_api_response(
            &json!({"id": "st1", "user": {"id": "u1", "username": "author"}, "expiring_at": "soon"}),
            &[],
            BatchMode::SkipInvalid,
        )
        .unwrap_err();
        assert!(err.has_issue("expiring_at"));
    }

    #[test]
    fn test_story_document_roundtrip() {
        let story = Story::from_api_response(
            &json!({"id": "st1", "user": {"id": "u1", "username": "author"}, "expiring_at": 1_700_086_400}),
            &[item("a")],
            BatchMode::Strict,
        )
        .unwrap();

        let doc = story.to_document(DocumentMode::Sparse).unwrap();
        assert_eq!(doc.get("_id"), Some(&json!("st1")));
        assert_eq!(doc["storyItems"][0]["_id"], json!("a"));
        assert_eq!(doc["storyItems"][0]["media"]["_id"], json!("a"));
        assert!(doc["storyItems"][0].get("id").is_none());

        let restored = Story::from_document(&doc).unwrap();
        assert_eq!(restored, story);
    }
}

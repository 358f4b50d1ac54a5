//! Media items: single images, videos, and carousel containers.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

use crate::coerce;
use crate::document::Document;
use crate::error::{CoerceError, ValidationError};
use crate::fields::{as_object, FieldReader, Object};
use crate::identity::UserCore;

/// What a media item holds. Stored as the upstream numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MediaKind {
    #[default]
    Image,
    Video,
    Carousel,
}

impl MediaKind {
    pub const IMAGE_CODE: i64 = 1;
    pub const VIDEO_CODE: i64 = 2;
    pub const CAROUSEL_CODE: i64 = 8;

    /// Unknown codes fall back to `Image`.
    pub fn from_code(code: i64) -> Self {
        match code {
            Self::VIDEO_CODE => Self::Video,
            Self::CAROUSEL_CODE => Self::Carousel,
            _ => Self::Image,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Image => Self::IMAGE_CODE,
            Self::Video => Self::VIDEO_CODE,
            Self::Carousel => Self::CAROUSEL_CODE,
        }
    }

    pub(crate) fn coerce(value: &Value) -> Result<Self, CoerceError> {
        coerce::int(value).map(Self::from_code)
    }
}

impl Serialize for MediaKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

/// One rendition of an image or video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaVersion {
    pub url: String,
    /// Local file path once downloaded.
    pub path: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

impl Document for MediaVersion {
    const KIND: &'static str = "media version";

    fn validate(doc: &Object) -> Result<Self, ValidationError> {
        let mut r = FieldReader::new(Self::KIND, doc);
        let version = Self {
            url: r.required_string("url"),
            path: r.optional_string("path"),
            width: r.optional_int("width"),
            height: r.optional_int("height"),
        };
        r.finish()?;
        Ok(version)
    }
}

/// Upstream versions arrive as a list or wrapped as `{"items": [...]}` /
/// `{"candidates": [...]}`. Only url and dimensions are carried over.
fn adapt_versions(raw: &Value) -> Value {
    let items = match raw {
        Value::Array(items) => items.as_slice(),
        Value::Object(wrapper) => wrapper
            .get("items")
            .or_else(|| wrapper.get("candidates"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    };

    items
        .iter()
        .map(|item| match item {
            Value::Object(v) => json!({
                "url": v.get("url").cloned().unwrap_or(Value::Null),
                "width": v.get("width").cloned().unwrap_or(Value::Null),
                "height": v.get("height").cloned().unwrap_or(Value::Null),
            }),
            other => other.clone(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tagged users
// ---------------------------------------------------------------------------

/// A user tagged on a media item, with a normalized (0.0–1.0) position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggedUser {
    #[serde(flatten)]
    pub user: UserCore,
    pub x: f64,
    pub y: f64,
    pub position: Option<Vec<f64>>,
}

impl TaggedUser {
    const DEFAULT_COORD: f64 = 0.5;

    pub fn from_api_response(data: &Value) -> Result<Self, ValidationError> {
        let data = as_object(Self::KIND, data)?;
        Self::validate(&Self::adapt(data))
    }

    /// Flattens the nested `user` and resolves the position. Missing user
    /// fields get placeholder values instead of rejecting the tag.
    pub(crate) fn adapt(data: &Object) -> Object {
        let mut x = data
            .get("x")
            .cloned()
            .unwrap_or(Value::from(Self::DEFAULT_COORD));
        let mut y = data
            .get("y")
            .cloned()
            .unwrap_or(Value::from(Self::DEFAULT_COORD));
        if let Some(position) = data.get("position").and_then(Value::as_array) {
            if position.len() >= 2 {
                x = position[0].clone();
                y = position[1].clone();
            }
        }

        let user = data.get("user").and_then(Value::as_object);
        let user_field = |name: &str, fallback: &str| -> Value {
            user.and_then(|u| u.get(name))
                .filter(|v| coerce::is_truthy(v))
                .cloned()
                .unwrap_or_else(|| Value::from(fallback))
        };

        let mut out = Object::new();
        out.insert("x".into(), x);
        out.insert("y".into(), y);
        out.insert(
            "position".into(),
            data.get("position").cloned().unwrap_or(Value::Null),
        );
        out.insert("id".into(), user_field("id", "unknown_user"));
        out.insert("username".into(), user_field("username", "unknown"));
        out.insert("full_name".into(), user_field("full_name", ""));
        out
    }
}

impl Document for TaggedUser {
    const KIND: &'static str = "tagged user";

    fn validate(doc: &Object) -> Result<Self, ValidationError> {
        let mut r = FieldReader::new(Self::KIND, doc);
        let user = UserCore::read(&mut r);
        let x = r.required_float("x");
        let y = r.required_float("y");
        let position = r.raw("position").and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter_map(|v| coerce::float(v).ok())
                .collect::<Vec<f64>>()
        });
        r.finish()?;

        Ok(Self {
            user,
            x,
            y,
            position,
        })
    }
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

/// A media item: standalone, the synthesized media of a post or story, or a
/// carousel slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub pk: Option<String>,

    pub media_type: MediaKind,
    pub media_format: Option<String>,
    pub product_type: Option<String>,

    pub original_width: Option<i64>,
    pub original_height: Option<i64>,

    pub image_versions: Vec<MediaVersion>,
    pub video_versions: Vec<MediaVersion>,
    pub video_duration: Option<f64>,
    pub has_audio: Option<bool>,

    pub tagged_users: Vec<TaggedUser>,
    pub is_video: Option<bool>,

    pub carousel_media_count: Option<i64>,
    pub carousel_media: Vec<Media>,

    pub accessibility_caption: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Media {
    pub fn from_api_response(data: &Value) -> Result<Self, ValidationError> {
        let data = as_object(Self::KIND, data)?;
        Self::validate(&Self::adapt(data))
    }

    /// Stand-in for a story item that carries no usable image or video.
    /// A carousel needs slides, so a carousel code yields an image.
    pub fn placeholder(id: impl Into<String>, kind: MediaKind) -> Self {
        let kind = match kind {
            MediaKind::Carousel => MediaKind::Image,
            other => other,
        };
        Self {
            id: Some(id.into()),
            pk: None,
            media_type: kind,
            media_format: None,
            product_type: None,
            original_width: None,
            original_height: None,
            image_versions: Vec::new(),
            video_versions: Vec::new(),
            video_duration: None,
            has_audio: None,
            tagged_users: Vec::new(),
            is_video: None,
            carousel_media_count: None,
            carousel_media: Vec::new(),
            accessibility_caption: None,
            created_at: None,
            updated_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.media_type
    }

    /// Versions of the item's own kind, best first as delivered upstream.
    pub fn versions(&self) -> &[MediaVersion] {
        match self.media_type {
            MediaKind::Video => &self.video_versions,
            _ => &self.image_versions,
        }
    }

    /// Upstream media payload → canonical shape.
    pub(crate) fn adapt(data: &Object) -> Object {
        let get = |name: &str| data.get(name).cloned().unwrap_or(Value::Null);
        let mut out = Object::new();

        let id = data.get("id").or_else(|| data.get("pk"));
        let pk = data.get("pk").or_else(|| data.get("id"));
        out.insert("id".into(), id.cloned().unwrap_or(Value::Null));
        out.insert("pk".into(), pk.cloned().unwrap_or(Value::Null));

        let kind_code = data.get("media_type").and_then(|v| coerce::int(v).ok());
        out.insert(
            "media_type".into(),
            Value::from(kind_code.unwrap_or(MediaKind::IMAGE_CODE)),
        );
        out.insert("media_format".into(), get("media_format"));
        out.insert("product_type".into(), get("product_type"));
        out.insert("original_width".into(), get("original_width"));
        out.insert("original_height".into(), get("original_height"));

        if let Some(images) = data.get("image_versions") {
            out.insert("image_versions".into(), adapt_versions(images));
        }
        if let Some(videos) = data.get("video_versions").filter(|v| coerce::is_truthy(v)) {
            out.insert("video_versions".into(), adapt_versions(videos));
        }

        out.insert("video_duration".into(), get("video_duration"));
        out.insert("has_audio".into(), get("has_audio"));
        out.insert(
            "is_video".into(),
            data.get("is_video")
                .cloned()
                .unwrap_or(Value::Bool(kind_code == Some(MediaKind::VIDEO_CODE))),
        );

        if let Some(count) = data.get("carousel_media_count") {
            out.insert("carousel_media_count".into(), count.clone());
        }
        if let Some(Value::Array(slides)) = data.get("carousel_media") {
            let adapted: Vec<Value> = slides
                .iter()
                .map(|slide| match slide {
                    Value::Object(s) => Value::Object(Self::adapt(s)),
                    other => other.clone(),
                })
                .collect();
            out.insert("carousel_media".into(), Value::Array(adapted));
        }

        let tags: Vec<Value> = data
            .get("tagged_users")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .map(|tag| match tag {
                        Value::Object(t) => Value::Object(TaggedUser::adapt(t)),
                        other => other.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        out.insert("tagged_users".into(), Value::Array(tags));

        out.insert("accessibility_caption".into(), get("accessibility_caption"));
        out.insert("created_at".into(), get("created_at"));
        out
    }
}

impl Document for Media {
    const KIND: &'static str = "media";

    fn validate(doc: &Object) -> Result<Self, ValidationError> {
        let mut r = FieldReader::new(Self::KIND, doc);
        let media = Self {
            id: r.optional_string("id"),
            pk: r.optional_string("pk"),
            media_type: r
                .raw("media_type")
                .and_then(|v| MediaKind::coerce(v).ok())
                .unwrap_or_default(),
            media_format: r.optional_string("media_format"),
            product_type: r.optional_string("product_type"),
            original_width: r.optional_int("original_width"),
            original_height: r.optional_int("original_height"),
            image_versions: r.entities("image_versions", MediaVersion::validate),
            video_versions: r.entities("video_versions", MediaVersion::validate),
            video_duration: r.optional_float("video_duration"),
            has_audio: r.optional_bool("has_audio"),
            tagged_users: r.entities("tagged_users", TaggedUser::validate),
            is_video: r.optional_bool("is_video"),
            carousel_media_count: r.optional_int("carousel_media_count"),
            carousel_media: r.entities("carousel_media", Media::validate),
            accessibility_caption: r.optional_string("accessibility_caption"),
            created_at: r.lenient_timestamp("created_at"),
            updated_at: r.timestamp_or_now("updated_at"),
        };

        if media.media_type == MediaKind::Carousel {
            if media.carousel_media.is_empty() {
                r.issue("carousel_media", CoerceError::Empty);
            }
            if !media.image_versions.is_empty() || !media.video_versions.is_empty() {
                r.issue(
                    "media_type",
                    CoerceError::Invalid("a carousel carries no direct versions".into()),
                );
            }
        }

        r.finish()?;
        Ok(media)
    }
}

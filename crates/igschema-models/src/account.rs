//! Full user profiles.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::document::{opaque, Document};
use crate::error::ValidationError;
use crate::fields::{as_object, FieldReader, Object};
use crate::identity::UserCore;
use crate::metrics::{MetricsHistory, UserMetrics};

const COUNTERS: [&str; 4] = [
    "follower_count",
    "following_count",
    "media_count",
    "total_igtv_videos",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePicInfo {
    pub url: String,
    pub width: i64,
    pub height: i64,
}

impl Document for ProfilePicInfo {
    const KIND: &'static str = "profile picture";

    fn validate(doc: &Object) -> Result<Self, ValidationError> {
        let mut r = FieldReader::new(Self::KIND, doc);
        let info = Self {
            url: r.required_string("url"),
            width: r.required_int("width"),
            height: r.required_int("height"),
        };
        r.finish()?;
        Ok(info)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BiographyWithEntities {
    pub raw_text: String,
    #[serde(serialize_with = "opaque")]
    pub entities: Vec<Value>,
}

impl Document for BiographyWithEntities {
    const KIND: &'static str = "biography";

    fn validate(doc: &Object) -> Result<Self, ValidationError> {
        let mut r = FieldReader::new(Self::KIND, doc);
        let bio = Self {
            raw_text: r.required_string("raw_text"),
            entities: r.json_list("entities"),
        };
        r.finish()?;
        Ok(bio)
    }
}

/// A user profile with its counter history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(flatten)]
    pub core: UserCore,

    // Profile
    pub biography: Option<String>,
    pub biography_email: Option<String>,
    pub biography_with_entities: Option<BiographyWithEntities>,
    pub external_url: Option<String>,
    pub external_lynx_url: Option<String>,
    pub country: Option<String>,

    // Profile picture
    pub profile_pic_url: Option<String>,
    pub profile_pic_url_hd: Option<String>,
    pub profile_pic_id: Option<String>,
    pub hd_profile_pic_url_info: Option<ProfilePicInfo>,
    #[serde(serialize_with = "opaque")]
    pub hd_profile_pic_versions: Vec<Value>,
    pub has_anonymous_profile_picture: Option<bool>,

    metrics: MetricsHistory<UserMetrics>,

    // Account status
    pub is_verified: Option<bool>,
    pub is_private: Option<bool>,
    pub is_business: Option<bool>,
    pub is_professional: Option<bool>,

    // Business
    pub account_type: Option<i64>,
    pub category: Option<String>,
    pub category_id: Option<i64>,
    pub business_contact_method: Option<String>,
    pub contact_phone_number: Option<String>,
    pub public_phone_number: Option<String>,
    pub public_phone_country_code: Option<String>,
    pub public_email: Option<String>,

    pub fbid_v2: Option<String>,
    #[serde(serialize_with = "opaque")]
    pub bio_links: Vec<Value>,
    pub has_chaining: Option<bool>,
    pub has_guides: Option<bool>,
    pub has_igtv_series: Option<bool>,
    pub latest_reel_media: Option<i64>,

    // Interaction settings
    pub direct_messaging: Option<String>,
    pub is_call_to_action_enabled: Option<bool>,
    pub is_category_tappable: Option<bool>,
    pub is_eligible_for_request_message: Option<bool>,
    pub is_profile_audio_call_enabled: Option<bool>,
    pub is_favorite: Option<bool>,
    pub is_favorite_for_clips: Option<bool>,
    pub is_favorite_for_igtv: Option<bool>,
    pub is_favorite_for_stories: Option<bool>,

    // Ads
    pub ads_incentive_expiration_date: Option<String>,
    pub ads_page_id: Option<String>,
    pub ads_page_name: Option<String>,
    pub current_catalog_id: Option<String>,

    #[serde(serialize_with = "opaque")]
    pub active_standalone_fundraisers: Option<Object>,

    /// Free-form "Month Year" text from the about section.
    pub date_joined: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Builds the profile and one metrics snapshot from the flat counters.
    ///
    /// Keys of the `about` sub-object override top-level ones. A counter
    /// block that fails to coerce leaves the history empty.
    pub fn from_api_response(data: &Value) -> Result<Self, ValidationError> {
        let data = as_object(Self::KIND, data)?;
        let mut doc = data.clone();

        if let Some(Value::Object(about)) = data.get("about") {
            for (key, value) in about {
                doc.insert(key.clone(), value.clone());
            }
        }
        doc.remove("metrics");

        let mut user = Self::validate(&doc)?;

        let mut counters = Object::new();
        for name in COUNTERS {
            counters.insert(
                name.to_string(),
                data.get(name).cloned().unwrap_or(Value::from(0)),
            );
        }
        if let Some(snapshot) = UserMetrics::try_coerce(&counters) {
            user.add_metrics(snapshot);
        }

        Ok(user)
    }

    pub fn add_metrics(&mut self, snapshot: UserMetrics) {
        self.metrics.push(snapshot);
    }

    pub fn get_latest_metrics(&self) -> Option<&UserMetrics> {
        self.metrics.latest()
    }

    pub fn get_metrics_history(&self) -> Vec<&UserMetrics> {
        self.metrics.history()
    }

    pub fn metrics(&self) -> &MetricsHistory<UserMetrics> {
        &self.metrics
    }

    pub fn follower_count(&self) -> Option<i64> {
        self.get_latest_metrics().map(|m| m.follower_count)
    }

    pub fn following_count(&self) -> Option<i64> {
        self.get_latest_metrics().map(|m| m.following_count)
    }

    pub fn media_count(&self) -> Option<i64> {
        self.get_latest_metrics().map(|m| m.media_count)
    }

    pub fn total_igtv_videos(&self) -> Option<i64> {
        self.get_latest_metrics().map(|m| m.total_igtv_videos)
    }
}

impl Document for User {
    const KIND: &'static str = "user";

    fn validate(doc: &Object) -> Result<Self, ValidationError> {
        let mut r = FieldReader::new(Self::KIND, doc);
        let user = Self {
            core: UserCore::read(&mut r),
            biography: r.optional_string("biography"),
            biography_email: r.optional_string("biography_email"),
            biography_with_entities: r
                .entity("biography_with_entities", BiographyWithEntities::validate),
            external_url: r.optional_string("external_url"),
            external_lynx_url: r.optional_string("external_lynx_url"),
            country: r.optional_string("country"),
            profile_pic_url: r.optional_string("profile_pic_url"),
            profile_pic_url_hd: r.optional_string("profile_pic_url_hd"),
            profile_pic_id: r.optional_string("profile_pic_id"),
            hd_profile_pic_url_info: r.entity("hd_profile_pic_url_info", ProfilePicInfo::validate),
            hd_profile_pic_versions: r.json_list("hd_profile_pic_versions"),
            has_anonymous_profile_picture: r.optional_bool("has_anonymous_profile_picture"),
            metrics: r
                .entities("metrics", UserMetrics::validate)
                .into_iter()
                .collect(),
            is_verified: r.optional_bool("is_verified"),
            is_private: r.optional_bool("is_private"),
            is_business: r.optional_bool("is_business"),
            is_professional: r.optional_bool("is_professional"),
            account_type: r.optional_int("account_type"),
            category: r.optional_string("category"),
            category_id: r.optional_int("category_id"),
            business_contact_method: r.optional_string("business_contact_method"),
            contact_phone_number: r.optional_string("contact_phone_number"),
            public_phone_number: r.optional_string("public_phone_number"),
            public_phone_country_code: r.optional_string("public_phone_country_code"),
            public_email: r.optional_string("public_email"),
            fbid_v2: r.optional_string("fbid_v2"),
            bio_links: r.json_list("bio_links"),
            has_chaining: r.optional_bool("has_chaining"),
            has_guides: r.optional_bool("has_guides"),
            has_igtv_series: r.optional_bool("has_igtv_series"),
            latest_reel_media: r.optional_int("latest_reel_media"),
            direct_messaging: r.optional_string("direct_messaging"),
            is_call_to_action_enabled: r.optional_bool("is_call_to_action_enabled"),
            is_category_tappable: r.optional_bool("is_category_tappable"),
            is_eligible_for_request_message: r.optional_bool("is_eligible_for_request_message"),
            is_profile_audio_call_enabled: r.optional_bool("is_profile_audio_call_enabled"),
            is_favorite: r.optional_bool("is_favorite"),
            is_favorite_for_clips: r.optional_bool("is_favorite_for_clips"),
            is_favorite_for_igtv: r.optional_bool("is_favorite_for_igtv"),
            is_favorite_for_stories: r.optional_bool("is_favorite_for_stories"),
            ads_incentive_expiration_date: r.optional_string("ads_incentive_expiration_date"),
            ads_page_id: r.optional_string("ads_page_id"),
            ads_page_name: r.optional_string("ads_page_name"),
            current_catalog_id: r.optional_string("current_catalog_id"),
            active_standalone_fundraisers: r.json_object("active_standalone_fundraisers"),
            date_joined: r.optional_string("date_joined"),
            updated_at: r.timestamp_or_now("updated_at"),
        };
        r.finish()?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentMode;
    use chrono::Duration;
    use serde_json::json;

    fn profile() -> Value {
        json!({
            "id": "123",
            "username": "testuser",
            "full_name": "Test User",
            "biography": "Test bio",
            "follower_count": 10,
            "following_count": 20,
            "media_count": 5,
            "is_verified": "true",
            "is_private": 0,
            "fbid_v2": 17841400000000000_i64,
            "bio_links": null,
            "hd_profile_pic_versions": null,
        })
    }

    #[test]
    fn test_metrics_from_flat_counters() {
        let user = User::from_api_response(&profile()).unwrap();

        assert_eq!(user.follower_count(), Some(10));
        assert_eq!(user.following_count(), Some(20));
        assert_eq!(user.media_count(), Some(5));
        assert_eq!(user.total_igtv_videos(), Some(0));
        assert_eq!(user.get_metrics_history().len(), 1);
    }

    #[test]
    fn test_profile_coercions() {
        let user = User::from_api_response(&profile()).unwrap();

        assert_eq!(user.core.id, "123");
        assert_eq!(user.core.username, "testuser");
        assert_eq!(user.biography.as_deref(), Some("Test bio"));
        assert_eq!(user.is_verified, Some(true));
        assert_eq!(user.is_private, Some(false));
        assert_eq!(user.fbid_v2.as_deref(), Some("17841400000000000"));
        assert!(user.bio_links.is_empty());
        assert!(user.hd_profile_pic_versions.is_empty());
    }

    #[test]
    fn test_missing_counters_default_to_zero() {
        let user = User::from_api_response(&json!({"id": "1", "username": "u"})).unwrap();
        assert_eq!(user.follower_count(), Some(0));
    }

    #[test]
    fn test_bad_counters_leave_history_empty() {
        let user = User::from_api_response(&json!({
            "id": "1",
            "username": "u",
            "follower_count": "invalid",
        }))
        .unwrap();
        assert!(user.metrics().is_empty());
        assert_eq!(user.follower_count(), None);
    }

    #[test]
    fn test_about_section_overrides() {
        let user = User::from_api_response(&json!({
            "id": "1",
            "username": "u",
            "country": "Nowhere",
            "about": {"country": "Germany", "date_joined": "March 2015", "is_business": true},
        }))
        .unwrap();

        assert_eq!(user.country.as_deref(), Some("Germany"));
        assert_eq!(user.date_joined.as_deref(), Some("March 2015"));
        assert_eq!(user.is_business, Some(true));
    }

    #[test]
    fn test_identity_is_required() {
        let err = User::from_api_response(&json!({"id": "1", "username": ""})).unwrap_err();
        assert!(err.has_issue("username"));
    }

    #[test]
    fn test_hd_picture_info() {
        let mut payload = profile();
        payload["hd_profile_pic_url_info"] = json!({"url": "https://pic", "width": "320", "height": 320});
        let user = User::from_api_response(&payload).unwrap();
        let info = user.hd_profile_pic_url_info.unwrap();
        assert_eq!((info.width, info.height), (320, 320));

        payload["hd_profile_pic_url_info"] = json!({"url": "https://pic"});
        let err = User::from_api_response(&payload).unwrap_err();
        assert!(err.has_issue("hd_profile_pic_url_info.width"));
    }

    #[test]
    fn test_added_metrics_become_latest() {
        let mut user = User::from_api_response(&profile()).unwrap();
        let newer = UserMetrics::new(11, 20, 6).captured(Utc::now() + Duration::hours(1));
        user.add_metrics(newer);

        assert_eq!(user.metrics().len(), 2);
        assert_eq!(user.follower_count(), Some(11));
        assert_eq!(user.get_metrics_history()[0].follower_count, 10);
    }

    #[test]
    fn test_document_shape_and_roundtrip() {
        let user = User::from_api_response(&profile()).unwrap();
        let doc = user.to_document(DocumentMode::Sparse).unwrap();

        assert_eq!(doc.get("_id"), Some(&json!("123")));
        assert!(!doc.contains_key("id"));
        assert_eq!(doc.get("fullName"), Some(&json!("Test User")));
        assert_eq!(doc["metrics"][0]["followerCount"], json!(10));
        assert!(!doc.contains_key("followerCount"));

        let restored = User::from_document(&doc).unwrap();
        assert_eq!(restored, user);
    }

    #[test]
    fn test_bio_links_kept_verbatim_in_storage() {
        let mut payload = profile();
        payload["bio_links"] = json!([{"url": "https://x", "title": null, "_id": "b1"}]);

        let user = User::from_api_response(&payload).unwrap();
        let doc = user.to_document(DocumentMode::Sparse).unwrap();
        assert_eq!(
            doc["bioLinks"],
            json!([{"url": "https://x", "title": null, "_id": "b1"}])
        );

        let restored = User::from_document(&doc).unwrap();
        assert_eq!(restored.bio_links, user.bio_links);
        assert_eq!(restored, user);
    }
}

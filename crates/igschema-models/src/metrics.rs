//! Time-stamped counter snapshots.
//!
//! Counters are never overwritten: every ingestion appends one snapshot to
//! the owning entity's history, and the "current" value is whatever the
//! newest snapshot says.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::document::Document;
use crate::error::ValidationError;
use crate::fields::{FieldReader, Object};

/// One capture of mutable counters.
pub trait Snapshot {
    fn captured_at(&self) -> DateTime<Utc>;
}

/// Append-only list of snapshots owned by a user or post.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetricsHistory<T> {
    items: Vec<T>,
}

impl<T> Default for MetricsHistory<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Snapshot> MetricsHistory<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, snapshot: T) {
        self.items.push(snapshot);
    }

    /// Snapshot with the greatest `captured_at`, if any. On a tie the one
    /// appended last wins.
    pub fn latest(&self) -> Option<&T> {
        self.items.iter().max_by_key(|s| s.captured_at())
    }

    /// All snapshots, oldest first. Ties keep insertion order.
    pub fn history(&self) -> Vec<&T> {
        let mut sorted: Vec<&T> = self.items.iter().collect();
        sorted.sort_by_key(|s| s.captured_at());
        sorted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Snapshots in insertion order.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T: Snapshot> FromIterator<T> for MetricsHistory<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// `captured_at`, falling back to the older `updated_at` name.
fn read_captured_at(r: &mut FieldReader<'_>) -> DateTime<Utc> {
    if r.raw("captured_at").is_none() && r.raw("updated_at").is_some() {
        r.timestamp_or_now("updated_at")
    } else {
        r.timestamp_or_now("captured_at")
    }
}

// ---------------------------------------------------------------------------
// User metrics
// ---------------------------------------------------------------------------

/// Follower / following / media counters of a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMetrics {
    pub follower_count: i64,
    pub following_count: i64,
    pub media_count: i64,
    pub total_igtv_videos: i64,
    pub captured_at: DateTime<Utc>,
}

impl UserMetrics {
    pub fn new(follower_count: i64, following_count: i64, media_count: i64) -> Self {
        Self {
            follower_count,
            following_count,
            media_count,
            total_igtv_videos: 0,
            captured_at: Utc::now(),
        }
    }

    pub fn captured(mut self, at: DateTime<Utc>) -> Self {
        self.captured_at = at;
        self
    }

    /// Validation that reports failure as `None` instead of an error. The
    /// adapters use this so a broken counter block leaves the history empty
    /// rather than rejecting the profile.
    pub fn try_coerce(doc: &Object) -> Option<Self> {
        match Self::validate(doc) {
            Ok(m) => Some(m),
            Err(e) => {
                debug!(error = %e, "Dropping user metrics snapshot");
                None
            }
        }
    }
}

impl Snapshot for UserMetrics {
    fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

impl Document for UserMetrics {
    const KIND: &'static str = "user metrics";

    fn validate(doc: &Object) -> Result<Self, ValidationError> {
        let mut r = FieldReader::new(Self::KIND, doc);
        let follower_count = r.required_int("follower_count");
        let following_count = r.required_int("following_count");
        let media_count = r.required_int("media_count");
        let total_igtv_videos = r.int_or("total_igtv_videos", 0);
        let captured_at = read_captured_at(&mut r);
        r.finish()?;

        Ok(Self {
            follower_count,
            following_count,
            media_count,
            total_igtv_videos,
            captured_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Post metrics
// ---------------------------------------------------------------------------

/// Engagement counters of a post. Every counter is optional and a bad value
/// only blanks that counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMetrics {
    pub like_count: Option<i64>,
    pub comment_count: Option<i64>,
    pub view_count: Option<i64>,
    pub play_count: Option<i64>,
    pub fb_like_count: Option<i64>,
    pub fb_play_count: Option<i64>,
    pub captured_at: DateTime<Utc>,
}

impl Default for PostMetrics {
    fn default() -> Self {
        Self {
            like_count: None,
            comment_count: None,
            view_count: None,
            play_count: None,
            fb_like_count: None,
            fb_play_count: None,
            captured_at: Utc::now(),
        }
    }
}

impl PostMetrics {
    pub fn captured(mut self, at: DateTime<Utc>) -> Self {
        self.captured_at = at;
        self
    }

    pub fn try_coerce(doc: &Object) -> Option<Self> {
        match Self::validate(doc) {
            Ok(m) => Some(m),
            Err(e) => {
                debug!(error = %e, "Dropping post metrics snapshot");
                None
            }
        }
    }
}

impl Snapshot for PostMetrics {
    fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

impl Document for PostMetrics {
    const KIND: &'static str = "post metrics";

    fn validate(doc: &Object) -> Result<Self, ValidationError> {
        let mut r = FieldReader::new(Self::KIND, doc);
        let like_count = r.optional_int("like_count");
        let comment_count = r.optional_int("comment_count");
        let view_count = r.optional_int("view_count");
        let play_count = r.optional_int("play_count");
        let fb_like_count = r.optional_int("fb_like_count");
        let fb_play_count = r.optional_int("fb_play_count");
        let captured_at = read_captured_at(&mut r);
        r.finish()?;

        Ok(Self {
            like_count,
            comment_count,
            view_count,
            play_count,
            fb_like_count,
            fb_play_count,
            captured_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn obj(value: serde_json::Value) -> Object {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_user_metrics_from_strings() {
        let m = UserMetrics::validate(&obj(json!({
            "follower_count": "100",
            "following_count": "50",
            "media_count": "10",
            "total_igtv_videos": "2",
        })))
        .unwrap();

        assert_eq!(m.follower_count, 100);
        assert_eq!(m.following_count, 50);
        assert_eq!(m.media_count, 10);
        assert_eq!(m.total_igtv_videos, 2);
    }

    #[test]
    fn test_user_metrics_required_counter_rejects() {
        let doc = obj(json!({"follower_count": "nope", "following_count": 1, "media_count": 1}));
        let err = UserMetrics::validate(&doc).unwrap_err();
        assert!(err.has_issue("follower_count"));
        assert!(UserMetrics::try_coerce(&doc).is_none());
    }

    #[test]
    fn test_post_metrics_bad_counter_degrades() {
        let m = PostMetrics::validate(&obj(json!({"like_count": "x", "comment_count": "3"}))).unwrap();
        assert_eq!(m.like_count, None);
        assert_eq!(m.comment_count, Some(3));
    }

    #[test]
    fn test_legacy_updated_at_is_read() {
        let m = PostMetrics::validate(&obj(json!({"updated_at": 0}))).unwrap();
        assert_eq!(m.captured_at.timestamp(), 0);
    }

    #[test]
    fn test_latest_and_history() {
        let now = Utc::now();
        let older = UserMetrics::new(1, 1, 1).captured(now - Duration::days(1));
        let newer = UserMetrics::new(2, 2, 2).captured(now);

        let mut history = MetricsHistory::new();
        assert!(history.latest().is_none());

        history.push(newer.clone());
        history.push(older.clone());

        assert_eq!(history.latest(), Some(&newer));
        let sorted: Vec<_> = history.history().into_iter().cloned().collect();
        assert_eq!(sorted, vec![older, newer]);
    }

    #[test]
    fn test_latest_tie_prefers_last_appended() {
        let at = Utc::now();
        let mut history = MetricsHistory::new();
        history.push(UserMetrics::new(1, 0, 0).captured(at));
        history.push(UserMetrics::new(2, 0, 0).captured(at));

        assert_eq!(history.latest().map(|m| m.follower_count), Some(2));
        let order: Vec<_> = history.history().iter().map(|m| m.follower_count).collect();
        assert_eq!(order, vec![1, 2]);
    }

    #[test]
    fn test_push_never_drops_snapshots() {
        let mut history = MetricsHistory::new();
        let first = PostMetrics::default();
        history.push(first.clone());
        for n in 1..=5 {
            let before = history.len();
            history.push(PostMetrics {
                like_count: Some(n),
                ..PostMetrics::default()
            });
            assert_eq!(history.len(), before + 1);
        }
        assert_eq!(history.as_slice()[0], first);
    }

    #[test]
    fn test_history_serializes_as_list() {
        let history: MetricsHistory<PostMetrics> = vec![PostMetrics::default()].into_iter().collect();
        let value = serde_json::to_value(&history).unwrap();
        assert!(value.is_array());
        assert!(value[0].get("capturedAt").is_some());
    }
}

//! # igschema-models
//!
//! Typed models for social-media API payloads (profiles, posts, comments,
//! stories, highlights, media, locations).
//!
//! Every entity offers:
//! - **`from_api_response`**: adapts a loosely-typed upstream payload
//!   (string numbers, null lists, nested wrappers, aliased ids) into the
//!   canonical shape and validates it
//! - **`to_document`**: the stored form, with `_id` in place of `id` and
//!   camelCase field names
//! - **`from_document`**: the way back from storage, through the same
//!   validation
//!
//! Mutable counters are kept as an append-only history of snapshots instead
//! of being overwritten on every ingestion.

pub mod account;
pub mod adapter;
pub mod caption;
pub mod coerce;
pub mod comment;
pub mod document;
pub mod error;
mod fields;
pub mod highlight;
pub mod identity;
pub mod location;
pub mod media;
pub mod metrics;
pub mod naming;
pub mod post;
pub mod story;

pub use account::{BiographyWithEntities, ProfilePicInfo, User};
pub use adapter::BatchMode;
pub use caption::Caption;
pub use comment::{Comment, CommentBody, CommentReply};
pub use document::{Document, DocumentMode};
pub use error::{CoerceError, FieldIssue, ValidationError};
pub use fields::Object;
pub use highlight::Highlight;
pub use identity::UserCore;
pub use location::Location;
pub use media::{Media, MediaKind, MediaVersion, TaggedUser};
pub use metrics::{MetricsHistory, PostMetrics, Snapshot, UserMetrics};
pub use post::Post;
pub use story::{Story, StoryItem, StoryMention};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::adapter::{first_alias, BatchMode};
use crate::document::Document;
use crate::error::{CoerceError, ValidationError};
use crate::fields::{as_object, FieldReader, Object};
use crate::identity::UserCore;
use crate::story::StoryItem;

const ID_PREFIX: &str = "highlight:";
const ID_ALIASES: [&str; 3] = ["highlight_id", "_id", "id"];

/// A saved collection of story items pinned to a profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub model_type: &'static str,
    #[serde(rename = "_id")]
    pub id: String,
    pub user: UserCore,
    pub title: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub media_count: Option<i64>,
    pub timestamp: DateTime<Utc>,
    story_items: Vec<StoryItem>,
}

impl Highlight {
    pub const MODEL_TYPE: &'static str = "highlight";

    /// Metadata comes from one upstream call and the items from another.
    /// The id is taken from the first of `highlight_id`, `_id`, `id`.
    pub fn from_api_response(
        data: &Value,
        items: &[Value],
        mode: BatchMode,
    ) -> Result<Self, ValidationError> {
        let data = as_object(Self::KIND, data)?;
        let mut doc = data.clone();
        doc.remove("story_items");
        match first_alias(data, &ID_ALIASES) {
            Some(id) => doc.insert("id".into(), id.clone()),
            None => doc.remove("id"),
        };

        let mut highlight = Self::validate(&doc)?;
        highlight.add_stories(StoryItem::from_api_response_items(items, mode)?);
        Ok(highlight)
    }

    pub fn add_story(&mut self, story: StoryItem) {
        self.story_items.push(story);
    }

    pub fn add_stories(&mut self, stories: impl IntoIterator<Item = StoryItem>) {
        self.story_items.extend(stories);
    }

    pub fn story_count(&self) -> usize {
        self.story_items.len()
    }

    pub fn has_stories(&self) -> bool {
        !self.story_items.is_empty()
    }

    pub fn story_items(&self) -> &[StoryItem] {
        &self.story_items
    }
}

/// `highlight:<id>` → `<id>`. Empty ids are refused.
fn read_id(r: &mut FieldReader<'_>) -> String {
    let raw = r.required_string("id");
    let id = raw.strip_prefix(ID_PREFIX).unwrap_or(&raw).to_string();
    if id.is_empty() && r.raw("id").is_some() {
        r.issue("id", CoerceError::Empty);
    }
    id
}

impl Document for Highlight {
    const KIND: &'static str = "highlight";

    fn validate(doc: &Object) -> Result<Self, ValidationError> {
        let mut r = FieldReader::new(Self::KIND, doc);
        let highlight = Self {
            model_type: Self::MODEL_TYPE,
            id: read_id(&mut r),
            user: r
                .required_entity("user", UserCore::validate)
                .unwrap_or_default(),
            title: r.optional_string("title"),
            created_at: r.optional_timestamp("created_at"),
            media_count: r.optional_int("media_count"),
            timestamp: r.timestamp_or_now("timestamp"),
            story_items: r.entities("story_items", StoryItem::validate),
        };
        r.finish()?;
        Ok(highlight)
    }
}

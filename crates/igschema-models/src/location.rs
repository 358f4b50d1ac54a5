use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::document::Document;
use crate::error::ValidationError;
use crate::fields::{as_object, FieldReader, Object};

/// A place referenced by posts and story items.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub pk: Option<String>,
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub facebook_places_id: Option<i64>,

    pub name: Option<String>,
    pub short_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,

    pub lng: Option<f64>,
    pub lat: Option<f64>,

    pub external_source: Option<String>,
    pub external_id: Option<String>,
    pub external_id_source: Option<String>,

    pub has_viewer_saved: Option<bool>,
    pub blurb: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,

    pub media_count: Option<i64>,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Location {
    /// `pk` and `id` stand in for each other, and a missing `media_count`
    /// reads as zero.
    pub fn from_api_response(data: &Value) -> Result<Self, ValidationError> {
        let data = as_object(Self::KIND, data)?;
        let mut doc = data.clone();

        let pk = data.get("pk").or_else(|| data.get("id")).cloned();
        let id = data.get("id").or_else(|| data.get("pk")).cloned();
        if let Some(pk) = pk {
            doc.insert("pk".into(), pk);
        }
        if let Some(id) = id {
            doc.insert("id".into(), id);
        }
        doc.entry("media_count").or_insert(Value::from(0));

        Self::validate(&doc)
    }
}

impl Document for Location {
    const KIND: &'static str = "location";

    fn validate(doc: &Object) -> Result<Self, ValidationError> {
        let mut r = FieldReader::new(Self::KIND, doc);
        let location = Self {
            pk: r.optional_string("pk"),
            id: r.optional_string("id"),
            facebook_places_id: r.optional_int("facebook_places_id"),
            name: r.optional_string("name"),
            short_name: r.optional_string("short_name"),
            address: r.optional_string("address"),
            city: r.optional_string("city"),
            lng: r.optional_float("lng"),
            lat: r.optional_float("lat"),
            external_source: r.optional_string("external_source"),
            external_id: r.optional_string("external_id"),
            external_id_source: r.optional_string("external_id_source"),
            has_viewer_saved: r.optional_bool("has_viewer_saved"),
            blurb: r.optional_string("blurb"),
            website: r.optional_string("website"),
            phone: r.optional_string("phone"),
            media_count: r.optional_int("media_count"),
            created_at: r.lenient_timestamp("created_at"),
            updated_at: r.timestamp_or_now("updated_at"),
        };
        r.finish()?;
        Ok(location)
    }
}

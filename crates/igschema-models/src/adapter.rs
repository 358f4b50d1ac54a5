//! Helpers shared by the `from_api_response` adapters.

use serde_json::Value;
use tracing::warn;

use crate::coerce;
use crate::error::ValidationError;
use crate::fields::Object;
use crate::media::{Media, MediaKind};

/// What a batch adapter does with an item that fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// Abort the batch with the first failure.
    Strict,
    /// Drop the item, log it and keep going.
    #[default]
    SkipInvalid,
}

/// Adapt every item of a batch with `adapt`, honoring `mode`.
pub fn adapt_batch<T>(
    kind: &'static str,
    items: &[Value],
    mode: BatchMode,
    adapt: impl Fn(&Value) -> Result<T, ValidationError>,
) -> Result<Vec<T>, ValidationError> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match adapt(item) {
            Ok(v) => out.push(v),
            Err(e) if mode == BatchMode::Strict => return Err(e),
            Err(e) => {
                let item_id = item
                    .get("id")
                    .and_then(|v| coerce::string(v).ok())
                    .unwrap_or_else(|| "unknown".to_string());
                warn!(kind, id = %item_id, error = %e, "Skipping invalid item");
            }
        }
    }
    Ok(out)
}

/// First non-null value among `names`, in declaration order.
pub(crate) fn first_alias<'a>(data: &'a Object, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .find_map(|name| data.get(*name).filter(|v| !v.is_null()))
}

/// Drop `name` when its value is empty, so an optional nested entity reads
/// as absent instead of failing validation.
pub(crate) fn drop_if_empty(doc: &mut Object, name: &str) {
    if doc.get(name).is_some_and(|v| !coerce::is_truthy(v)) {
        doc.remove(name);
    }
}

fn non_empty<'a>(data: &'a Object, name: &str) -> Option<&'a Value> {
    data.get(name).filter(|v| coerce::is_truthy(v))
}

/// Kind of the single media item described by top-level fields, if any.
///
/// A flagged video (`is_video` or `media_type == 2`) needs video versions.
/// Otherwise image versions win, and bare video versions still make a video.
pub(crate) fn flat_media_kind(data: &Object) -> Option<MediaKind> {
    let flagged_video = data.get("is_video").is_some_and(coerce::is_truthy)
        || data
            .get("media_type")
            .and_then(|v| coerce::int(v).ok())
            .is_some_and(|code| code == MediaKind::VIDEO_CODE);

    let has_videos = non_empty(data, "video_versions").is_some();
    let has_images = non_empty(data, "image_versions").is_some();

    match (flagged_video, has_videos, has_images) {
        (true, true, _) => Some(MediaKind::Video),
        (true, false, _) => None,
        (false, _, true) => Some(MediaKind::Image),
        (false, true, false) => Some(MediaKind::Video),
        (false, false, false) => None,
    }
}

/// Build the canonical media map for a payload that carries its image or
/// video versions at the top level. The item inherits dimensions and tagged
/// users; a missing id becomes `vid_<suffix>` / `img_<suffix>`.
pub(crate) fn synthesize_flat_media(data: &Object, id_suffix: &str) -> Option<Object> {
    let kind = flat_media_kind(data)?;
    let get = |name: &str| data.get(name).cloned().unwrap_or(Value::Null);

    let mut media = Object::new();
    media.insert("media_type".into(), Value::from(kind.code()));
    let fallback_id = match kind {
        MediaKind::Video => format!("vid_{id_suffix}"),
        _ => format!("img_{id_suffix}"),
    };
    media.insert(
        "id".into(),
        data.get("id").cloned().unwrap_or(Value::String(fallback_id)),
    );
    media.insert("tagged_users".into(), get("tagged_users"));
    match kind {
        MediaKind::Video => {
            media.insert("video_versions".into(), get("video_versions"));
            media.insert("video_duration".into(), get("video_duration"));
            media.insert("has_audio".into(), get("has_audio"));
        }
        _ => {
            media.insert("image_versions".into(), get("image_versions"));
        }
    }
    media.insert("original_width".into(), get("original_width"));
    media.insert("original_height".into(), get("original_height"));

    Some(Media::adapt(&media))
}

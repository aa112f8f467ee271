//! Mapping of raw board API records into [`Item`] values.
//!
//! Record shape (Miro REST v2):
//! - `id`, `type`
//! - `data.content` (notes, text, shapes) or `data.title` (frames)
//! - `position.{x,y}`, `parent.id`, `style`
//! - connectors: `startItem.id`, `endItem.id`, `captions[].content`

use std::sync::LazyLock;

use boardsmith_shared::{Item, ItemType, Position};
use regex::Regex;
use serde_json::{Map, Value};

/// Matches any HTML tag.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));

/// Strip HTML tags and decode the handful of entities the board API emits.
pub fn clean_html(raw: &str) -> String {
    let stripped = TAG_RE.replace_all(raw, "");
    stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// Convert a raw record into an [`Item`].
///
/// Returns `None` when the record has no string `id` or `type`; the whole
/// record is otherwise kept as the item's metadata.
pub fn parse_item(record: Value) -> Option<Item> {
    let Value::Object(record) = record else {
        return None;
    };

    let id = record.get("id")?.as_str()?.to_string();
    let item_type = ItemType::from(record.get("type")?.as_str()?);

    let raw_content = if item_type == ItemType::Connector {
        caption_text(&record)
    } else {
        data_text(&record)
    };

    let position = record.get("position").and_then(|p| {
        Some(Position {
            x: p.get("x")?.as_f64()?,
            y: p.get("y")?.as_f64()?,
        })
    });

    let parent_id = record
        .get("parent")
        .and_then(|p| p.get("id"))
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(String::from);

    let style = match record.get("style") {
        Some(Value::Object(style)) => style.clone(),
        _ => Map::new(),
    };

    Some(Item {
        id,
        item_type,
        content: clean_html(&raw_content),
        position,
        parent_id,
        style,
        metadata: record,
    })
}

/// `data.content`, falling back to `data.title`.
fn data_text(record: &Map<String, Value>) -> String {
    let Some(data) = record.get("data") else {
        return String::new();
    };
    ["content", "title"]
        .iter()
        .filter_map(|key| data.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Caption texts of a connector, joined by spaces.
fn caption_text(record: &Map<String, Value>) -> String {
    record
        .get("captions")
        .and_then(Value::as_array)
        .map(|captions| {
            captions
                .iter()
                .filter_map(|c| c.get("content").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

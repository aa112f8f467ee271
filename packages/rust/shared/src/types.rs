//! Board-side domain types: items, relations and the structural graph.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one pipeline run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// Board item type tag. Unknown tags are kept verbatim in [`ItemType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemType {
    StickyNote,
    Text,
    Shape,
    Frame,
    Connector,
    Card,
    Image,
    Other(String),
}

impl ItemType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::StickyNote => "sticky_note",
            Self::Text => "text",
            Self::Shape => "shape",
            Self::Frame => "frame",
            Self::Connector => "connector",
            Self::Card => "card",
            Self::Image => "image",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for ItemType {
    fn from(s: &str) -> Self {
        match s {
            "sticky_note" => Self::StickyNote,
            "text" => Self::Text,
            "shape" => Self::Shape,
            "frame" => Self::Frame,
            "connector" => Self::Connector,
            "card" => Self::Card,
            "image" => Self::Image,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ItemType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<ItemType> for String {
    fn from(t: ItemType) -> Self {
        t.as_str().to_string()
    }
}

/// Canvas coordinates of an item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A single visual element on the board. Built once from a source record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique within a run.
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    /// Plain text, HTML stripped.
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Containing item, usually a frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub style: Map<String, Value>,
    /// The original source record, unmodified.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Item {
    /// Create an item with empty content, style and metadata.
    pub fn new(id: impl Into<String>, item_type: impl Into<ItemType>) -> Self {
        Self {
            id: id.into(),
            item_type: item_type.into(),
            content: String::new(),
            position: None,
            parent_id: None,
            style: Map::new(),
            metadata: Map::new(),
        }
    }

    pub fn is_frame(&self) -> bool {
        self.item_type == ItemType::Frame
    }

    pub fn is_connector(&self) -> bool {
        self.item_type == ItemType::Connector
    }

    /// Read `metadata[key].id` as a non-empty string.
    pub fn metadata_ref(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)?
            .get("id")?
            .as_str()
            .filter(|id| !id.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Relation
// ---------------------------------------------------------------------------

/// Kind of edge between two items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    Contains,
    ConnectedTo,
}

/// Directed edge `source_id → target_id`. Duplicates and cycles are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Relation {
    pub source_id: String,
    pub target_id: String,
    #[serde(rename = "type")]
    pub relation_type: RelationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Relation {
    pub fn contains(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            source_id: parent.into(),
            target_id: child.into(),
            relation_type: RelationType::Contains,
            label: None,
        }
    }

    pub fn connected_to(
        start: impl Into<String>,
        end: impl Into<String>,
        label: Option<String>,
    ) -> Self {
        Self {
            source_id: start.into(),
            target_id: end.into(),
            relation_type: RelationType::ConnectedTo,
            label,
        }
    }
}

// ---------------------------------------------------------------------------
// StructuralGraph
// ---------------------------------------------------------------------------

/// Items plus inferred relations, independent of any output schema.
///
/// Relation endpoints are expected to name items in `items`, but dangling
/// references are tolerated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuralGraph {
    #[serde(default)]
    pub items: BTreeMap<String, Item>,
    /// Discovery order; not semantically meaningful.
    #[serde(default)]
    pub relations: Vec<Relation>,
    #[serde(default)]
    pub frames: BTreeSet<String>,
}

impl StructuralGraph {
    pub fn relations_of(&self, relation_type: RelationType) -> impl Iterator<Item = &Relation> {
        self.relations
            .iter()
            .filter(move |r| r.relation_type == relation_type)
    }

    /// Relations whose source or target is not a known item.
    pub fn dangling_relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.iter().filter(|r| {
            !self.items.contains_key(&r.source_id) || !self.items.contains_key(&r.target_id)
        })
    }

    /// Relations as a sorted multiset, for order-insensitive comparison.
    pub fn relation_multiset(&self) -> Vec<Relation> {
        let mut sorted = self.relations.clone();
        sorted.sort();
        sorted
    }
}

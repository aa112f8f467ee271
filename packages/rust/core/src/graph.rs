//! Structural graph builder.
//!
//! Turns a flat collection of board items into frames, `contains` edges
//! (from `parent_id`) and `connected_to` edges (from connector endpoints).

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, instrument};

use boardsmith_shared::{Item, Relation, StructuralGraph};

/// Build the structural graph for a set of items.
///
/// Three independent passes over the items, each linear:
/// 1. Frame identification
/// 2. Containment from `parent_id` (unknown parents are skipped)
/// 3. Connectors with both endpoints present become `connected_to` edges
///
/// Items are keyed by id; if an id repeats, the last item wins. Output is a
/// function of the item set alone, independent of input order.
#[instrument(skip_all)]
pub fn build_graph(items: impl IntoIterator<Item = Item>) -> StructuralGraph {
    let items: BTreeMap<String, Item> = items
        .into_iter()
        .map(|item| (item.id.clone(), item))
        .collect();

    let mut graph = StructuralGraph {
        frames: identify_frames(&items),
        relations: Vec::new(),
        items: BTreeMap::new(),
    };
    graph.relations.extend(identify_containment(&items));
    graph.relations.extend(identify_connectors(&items));
    graph.items = items;

    let dangling = graph.dangling_relations().count();
    debug!(
        items = graph.items.len(),
        frames = graph.frames.len(),
        relations = graph.relations.len(),
        dangling,
        "structural graph built"
    );

    graph
}

fn identify_frames(items: &BTreeMap<String, Item>) -> BTreeSet<String> {
    items
        .values()
        .filter(|item| item.is_frame())
        .map(|item| item.id.clone())
        .collect()
}

fn identify_containment(items: &BTreeMap<String, Item>) -> Vec<Relation> {
    items
        .values()
        .filter_map(|item| {
            let parent = item.parent_id.as_deref().filter(|p| !p.is_empty())?;
            items
                .contains_key(parent)
                .then(|| Relation::contains(parent, &item.id))
        })
        .collect()
}

fn identify_connectors(items: &BTreeMap<String, Item>) -> Vec<Relation> {
    items
        .values()
        .filter(|item| item.is_connector())
        .filter_map(|item| {
            let start = item.metadata_ref("startItem")?;
            let end = item.metadata_ref("endItem")?;
            let label = Some(item.content.clone()).filter(|c| !c.is_empty());
            Some(Relation::connected_to(start, end, label))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardsmith_shared::{ItemType, RelationType};
    use serde_json::json;

    fn child(id: &str, parent: &str) -> Item {
        let mut item = Item::new(id, ItemType::StickyNote);
        item.parent_id = Some(parent.into());
        item
    }

    fn connector(id: &str, start: Option<&str>, end: Option<&str>, text: &str) -> Item {
        let mut item = Item::new(id, ItemType::Connector);
        item.content = text.into();
        if let Some(start) = start {
            item.metadata.insert("startItem".into(), json!({"id": start}));
        }
        if let Some(end) = end {
            item.metadata.insert("endItem".into(), json!({"id": end}));
        }
        item
    }

    fn scenario() -> Vec<Item> {
        vec![
            Item::new("F", ItemType::Frame),
            child("A", "F"),
            child("B", "F"),
            Item::new("C", ItemType::Shape),
            Item::new("D", ItemType::Shape),
            connector("X", Some("C"), Some("D"), "hands off to"),
        ]
    }

    #[test]
    fn frame_with_children_and_connector() {
        let graph = build_graph(scenario());

        assert_eq!(graph.frames.iter().collect::<Vec<_>>(), ["F"]);
        assert_eq!(graph.relations.len(), 3);

        let contains: Vec<_> = graph.relations_of(RelationType::Contains).collect();
        assert_eq!(contains.len(), 2);
        assert!(contains.contains(&&Relation::contains("F", "A")));
        assert!(contains.contains(&&Relation::contains("F", "B")));

        let connected: Vec<_> = graph.relations_of(RelationType::ConnectedTo).collect();
        assert_eq!(
            connected,
            [&Relation::connected_to("C", "D", Some("hands off to".into()))]
        );
    }

    #[test]
    fn deterministic_for_same_input() {
        let first = build_graph(scenario());
        let second = build_graph(scenario());
        assert_eq!(first.frames, second.frames);
        assert_eq!(first.relation_multiset(), second.relation_multiset());
    }

    #[test]
    fn insensitive_to_input_order() {
        let mut reversed = scenario();
        reversed.reverse();
        assert_eq!(build_graph(scenario()), build_graph(reversed));
    }

    #[test]
    fn dangling_parent_is_skipped() {
        let graph = build_graph(vec![child("A", "missing"), Item::new("B", ItemType::Text)]);
        assert!(graph.relations.is_empty());
        assert_eq!(graph.items.len(), 2);
    }

    #[test]
    fn empty_parent_id_is_ignored() {
        let graph = build_graph(vec![child("A", ""), Item::new("", ItemType::Frame)]);
        assert_eq!(graph.relations_of(RelationType::Contains).count(), 0);
    }

    #[test]
    fn connector_missing_endpoint_is_skipped() {
        let graph = build_graph(vec![
            Item::new("C", ItemType::Shape),
            connector("X1", Some("C"), None, "half"),
            connector("X2", None, Some("C"), "other half"),
            connector("X3", None, None, ""),
        ]);
        assert_eq!(graph.relations_of(RelationType::ConnectedTo).count(), 0);
    }

    #[test]
    fn connector_to_unknown_items_is_kept() {
        let graph = build_graph(vec![connector("X", Some("ghost1"), Some("ghost2"), "")]);
        assert_eq!(graph.relations.len(), 1);
        assert_eq!(graph.relations[0].label, None);
        assert_eq!(graph.dangling_relations().count(), 1);
    }

    #[test]
    fn duplicate_relations_are_permitted() {
        let graph = build_graph(vec![
            Item::new("C", ItemType::Shape),
            Item::new("D", ItemType::Shape),
            connector("X1", Some("C"), Some("D"), ""),
            connector("X2", Some("C"), Some("D"), ""),
            connector("X3", Some("D"), Some("C"), ""),
        ]);
        assert_eq!(graph.relations.len(), 3);
    }

    #[test]
    fn nested_frames() {
        let mut inner = Item::new("inner", ItemType::Frame);
        inner.parent_id = Some("outer".into());
        let graph = build_graph(vec![
            Item::new("outer", ItemType::Frame),
            inner,
            child("note", "inner"),
        ]);
        assert_eq!(graph.frames.len(), 2);
        assert_eq!(
            graph.relation_multiset(),
            vec![
                Relation::contains("inner", "note"),
                Relation::contains("outer", "inner"),
            ]
        );
    }

    #[test]
    fn empty_input() {
        assert_eq!(build_graph(Vec::new()), StructuralGraph::default());
    }
}

//! Flattened id index over the artifact's document forest.
//!
//! # Responsibility
//! - Map every node id, at any depth and across all trees, to its node.
//! - Record each node's parent slot so ancestry can be walked without
//!   following owned child pointers.
//!
//! # Invariants
//! - Roots have no parent slot.
//! - When ids collide the lookup keeps the last node seen; collisions are
//!   still listed by `duplicate_ids`.
//! - The index is read-only after `build`.

use crate::model::artifact::DocumentNode;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy)]
struct IndexedNode<'a> {
    node: &'a DocumentNode,
    parent: Option<usize>,
}

/// Arena of borrowed nodes plus an id lookup.
#[derive(Debug, Clone, Default)]
pub struct DocumentIndex<'a> {
    nodes: Vec<IndexedNode<'a>>,
    by_id: HashMap<&'a str, usize>,
    duplicates: BTreeSet<&'a str>,
}

impl<'a> DocumentIndex<'a> {
    /// Flattens `documents` depth-first.
    pub fn build(documents: &'a [DocumentNode]) -> Self {
        let mut index = Self::default();
        let mut stack: Vec<(&'a DocumentNode, Option<usize>)> =
            documents.iter().rev().map(|root| (root, None)).collect();

        while let Some((node, parent)) = stack.pop() {
            let slot = index.nodes.len();
            index.nodes.push(IndexedNode { node, parent });
            if index.by_id.insert(node.id.as_str(), slot).is_some() {
                index.duplicates.insert(node.id.as_str());
            }
            stack.extend(node.children.iter().rev().map(|child| (child, Some(slot))));
        }

        index
    }

    /// Number of indexed nodes, duplicates included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Looks up a node by id.
    pub fn get(&self, id: &str) -> Option<&'a DocumentNode> {
        self.by_id.get(id).map(|slot| self.nodes[*slot].node)
    }

    /// Parent id of `id`; `None` for roots and unknown ids.
    pub fn parent_id(&self, id: &str) -> Option<&'a str> {
        let slot = *self.by_id.get(id)?;
        let parent = self.nodes[slot].parent?;
        Some(self.nodes[parent].node.id.as_str())
    }

    /// Returns whether `ancestor` appears anywhere on the parent chain of
    /// `descendant`. A node is not its own ancestor.
    pub fn is_ancestor(&self, ancestor: &str, descendant: &str) -> bool {
        let Some(&start) = self.by_id.get(descendant) else {
            return false;
        };

        let mut cursor = self.nodes[start].parent;
        // Parent slots always point backwards, but the walk stays bounded anyway.
        let mut remaining = self.nodes.len();
        while let Some(slot) = cursor {
            if remaining == 0 {
                return false;
            }
            remaining -= 1;

            let entry = &self.nodes[slot];
            if entry.node.id == ancestor {
                return true;
            }
            cursor = entry.parent;
        }
        false
    }

    /// Ids declared by more than one node, sorted.
    pub fn duplicate_ids(&self) -> Vec<&'a str> {
        self.duplicates.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::DocumentIndex;
    use crate::model::artifact::DocumentNode;

    fn node(id: &str, children: Vec<DocumentNode>) -> DocumentNode {
        DocumentNode {
            id: id.to_string(),
            kind: None,
            text: Some(format!("text of {id}")),
            children,
        }
    }

    fn forest() -> Vec<DocumentNode> {
        vec![
            node(
                "d1",
                vec![node("s1", vec![node("b1", vec![node("p1", vec![])])])],
            ),
            node("d2", vec![node("p2", vec![])]),
        ]
    }

    #[test]
    fn indexes_every_depth_and_tree() {
        let documents = forest();
        let index = DocumentIndex::build(&documents);

        assert_eq!(index.len(), 6);
        for id in ["d1", "s1", "b1", "p1", "d2", "p2"] {
            assert!(index.contains(id), "missing {id}");
        }
        assert_eq!(index.get("p1").map(|n| n.text()), Some("text of p1"));
        assert!(index.get("nope").is_none());
    }

    #[test]
    fn parent_map_marks_roots() {
        let documents = forest();
        let index = DocumentIndex::build(&documents);

        assert_eq!(index.parent_id("d1"), None);
        assert_eq!(index.parent_id("d2"), None);
        assert_eq!(index.parent_id("s1"), Some("d1"));
        assert_eq!(index.parent_id("p1"), Some("b1"));
        assert_eq!(index.parent_id("p2"), Some("d2"));
    }

    #[test]
    fn ancestry_is_transitive_and_directional() {
        let documents = forest();
        let index = DocumentIndex::build(&documents);

        assert!(index.is_ancestor("b1", "p1"));
        assert!(index.is_ancestor("s1", "p1"));
        assert!(index.is_ancestor("d1", "p1"));
        assert!(!index.is_ancestor("p1", "d1"));
        assert!(!index.is_ancestor("d2", "p1"));
        assert!(!index.is_ancestor("p1", "p1"));
        assert!(!index.is_ancestor("d1", "missing"));
    }

    #[test]
    fn duplicate_ids_keep_last_seen_node() {
        let mut documents = forest();
        documents.push(node("p1", vec![]));
        let index = DocumentIndex::build(&documents);

        assert_eq!(index.duplicate_ids(), vec!["p1"]);
        assert_eq!(index.parent_id("p1"), None);
        assert_eq!(index.len(), 7);
    }

    #[test]
    fn empty_forest_builds_empty_index() {
        let index = DocumentIndex::build(&[]);
        assert!(index.is_empty());
        assert!(index.duplicate_ids().is_empty());
    }
}

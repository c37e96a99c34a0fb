//! Tree Store: copy-on-write operations over a [`Forest`].
//!
//! Every operation takes `&self` and returns a new forest. The ancestor path of a
//! matched node is rebuilt; an unknown id yields a forest equal to the input.

use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::ids::IdSource;
use crate::domain::{Forest, Node, NodeDraft, NodeId};

/// Create `count` placeholder children for a parent titled `parent_title`.
///
/// The k-th child (1-indexed) is titled `Child k of <parent_title>`.
pub fn generate_children(count: usize, parent_title: &str, ids: &mut dyn IdSource) -> Vec<Node> {
    (1..=count)
        .map(|k| Node {
            id: ids.next_id(),
            title: format!("Child {k} of {parent_title}"),
            question: format!("Auto-generated child {k}"),
            children: Vec::new(),
        })
        .collect()
}

impl Node {
    /// Materialize a draft as a new node with a fresh id and generated children.
    pub fn from_draft(draft: &NodeDraft, ids: &mut dyn IdSource) -> Node {
        let id = ids.next_id();
        Node {
            id,
            title: draft.title.clone(),
            question: draft.question.clone(),
            children: generate_children(draft.child_count, &draft.title, ids),
        }
    }
}

/// Rebuild `nodes`, replacing every node whose id equals `id` with `replace(node)`.
///
/// A replaced node is not descended into; its replacement is final.
fn replace_matching(
    nodes: &[Node],
    id: &NodeId,
    replace: &mut dyn FnMut(&Node) -> Node,
) -> Vec<Node> {
    nodes
        .iter()
        .map(|node| {
            if &node.id == id {
                replace(node)
            } else {
                node.rebuilt(replace_matching(&node.children, id, replace))
            }
        })
        .collect()
}

/// Drop every node whose id equals `id`, at any depth, with its subtree.
fn prune(nodes: &[Node], id: &NodeId) -> Vec<Node> {
    nodes
        .iter()
        .filter(|node| &node.id != id)
        .map(|node| node.rebuilt(prune(&node.children, id)))
        .collect()
}

impl Forest {
    /// Append a new root built from `draft`.
    #[instrument(level = "debug", skip(self, ids))]
    pub fn add_root(&self, draft: &NodeDraft, ids: &mut dyn IdSource) -> Forest {
        let mut roots = self.roots.clone();
        roots.push(Node::from_draft(draft, ids));
        Forest { roots }
    }

    /// Append a new node built from `draft` under `parent_id`.
    ///
    /// Unknown `parent_id` is a no-op.
    #[instrument(level = "debug", skip(self, ids))]
    pub fn add_child(&self, parent_id: &NodeId, draft: &NodeDraft, ids: &mut dyn IdSource) -> Forest {
        let roots = replace_matching(&self.roots, parent_id, &mut |parent| {
            let mut children = parent.children.clone();
            children.push(Node::from_draft(draft, ids));
            parent.rebuilt(children)
        });
        Forest { roots }
    }

    /// Replace title and question of `id` and regenerate its children.
    ///
    /// Existing children and their subtrees are discarded; the new
    /// placeholders are named after the new title.
    #[instrument(level = "debug", skip(self, ids))]
    pub fn update_node(&self, id: &NodeId, draft: &NodeDraft, ids: &mut dyn IdSource) -> Forest {
        let roots = replace_matching(&self.roots, id, &mut |node| Node {
            id: node.id.clone(),
            title: draft.title.clone(),
            question: draft.question.clone(),
            children: generate_children(draft.child_count, &draft.title, ids),
        });
        Forest { roots }
    }

    /// Regenerate the children of `id` as `new_count` placeholders named after its current title.
    #[instrument(level = "debug", skip(self, ids))]
    pub fn resize_children(&self, id: &NodeId, new_count: usize, ids: &mut dyn IdSource) -> Forest {
        let roots = replace_matching(&self.roots, id, &mut |node| {
            node.rebuilt(generate_children(new_count, &node.title, ids))
        });
        Forest { roots }
    }

    /// Remove every node with `id`, wherever it occurs, together with its subtree.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_node(&self, id: &NodeId) -> Forest {
        Forest {
            roots: prune(&self.roots, id),
        }
    }

    /// Depth-first search for `id`.
    pub fn find(&self, id: &NodeId) -> Option<&Node> {
        self.iter().find(|node| &node.id == id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.find(id).is_some()
    }

    /// Total number of nodes at all depths.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Number of levels in the deepest tree; 0 for an empty forest.
    pub fn depth(&self) -> usize {
        fn node_depth(node: &Node) -> usize {
            1 + node.children.iter().map(node_depth).max().unwrap_or(0)
        }
        self.roots.iter().map(node_depth).max().unwrap_or(0)
    }

    /// All nodes without children, in pre-order.
    pub fn leaves(&self) -> Vec<&Node> {
        self.iter().filter(|node| node.is_leaf()).collect()
    }

    /// Pre-order iterator over every node, roots left to right.
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder::new(&self.roots)
    }

    /// Largest numeric id in the forest, if any.
    pub fn max_numeric_id(&self) -> Option<u64> {
        self.iter().filter_map(|node| node.id.as_number()).max()
    }

    /// Check that every id occurs once.
    pub fn validate(&self) -> DomainResult<()> {
        let mut seen = HashSet::new();
        for node in self.iter() {
            if !seen.insert(&node.id) {
                debug!("validate: duplicate id {}", node.id);
                return Err(DomainError::DuplicateId(node.id.clone()));
            }
        }
        Ok(())
    }
}

/// Pre-order traversal with an explicit stack.
pub struct PreOrder<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> PreOrder<'a> {
    fn new(roots: &'a [Node]) -> Self {
        Self {
            stack: roots.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Reverse push keeps left-to-right order
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::SequentialIdSource;

    fn titles(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(|n| n.title.as_str()).collect()
    }

    #[test]
    fn given_empty_forest_when_adding_root_then_generates_named_children() {
        let mut ids = SequentialIdSource::default();
        let forest = Forest::new().add_root(&NodeDraft::new("A", "Q?", 2), &mut ids);

        assert_eq!(forest.roots().len(), 1);
        let root = &forest.roots()[0];
        assert_eq!(root.title, "A");
        assert_eq!(titles(&root.children), vec!["Child 1 of A", "Child 2 of A"]);
        assert_eq!(root.children[1].question, "Auto-generated child 2");
        assert!(root.children.iter().all(Node::is_leaf));
    }

    #[test]
    fn given_input_forest_when_operating_then_input_is_untouched() {
        let mut ids = SequentialIdSource::default();
        let before = Forest::new().add_root(&NodeDraft::new("A", "Q?", 1), &mut ids);
        let snapshot = before.clone();

        let child_id = before.roots()[0].children[0].id.clone();
        let _ = before.add_child(&child_id, &NodeDraft::new("B", "Q", 0), &mut ids);
        let _ = before.update_node(&child_id, &NodeDraft::new("C", "Q", 3), &mut ids);
        let _ = before.delete_node(&child_id);

        assert_eq!(before, snapshot);
    }

    #[test]
    fn given_nested_parent_when_adding_child_then_appends_at_end() {
        let mut ids = SequentialIdSource::default();
        let forest = Forest::new().add_root(&NodeDraft::new("A", "Q?", 1), &mut ids);
        let parent = forest.roots()[0].children[0].id.clone();

        let forest = forest.add_child(&parent, &NodeDraft::new("X", "QX", 0), &mut ids);
        let forest = forest.add_child(&parent, &NodeDraft::new("Y", "QY", 1), &mut ids);

        let parent = forest.find(&parent).unwrap();
        assert_eq!(titles(&parent.children), vec!["X", "Y"]);
        assert_eq!(titles(&parent.children[1].children), vec!["Child 1 of Y"]);
    }

    #[test]
    fn given_unknown_id_when_applying_any_operation_then_forest_is_unchanged() {
        let mut ids = SequentialIdSource::default();
        let forest = Forest::new().add_root(&NodeDraft::new("A", "Q?", 2), &mut ids);
        let missing = NodeId::from(9_999u64);
        let draft = NodeDraft::new("Z", "QZ", 4);

        assert_eq!(forest.add_child(&missing, &draft, &mut ids), forest);
        assert_eq!(forest.update_node(&missing, &draft, &mut ids), forest);
        assert_eq!(forest.resize_children(&missing, 5, &mut ids), forest);
        assert_eq!(forest.delete_node(&missing), forest);
    }

    #[test]
    fn given_node_with_custom_children_when_updating_then_replaces_with_placeholders() {
        let mut ids = SequentialIdSource::default();
        let forest = Forest::new().add_root(&NodeDraft::new("A", "Q?", 1), &mut ids);
        let root = forest.roots()[0].id.clone();
        let forest = forest.add_child(&root, &NodeDraft::new("Custom", "keep?", 2), &mut ids);
        let custom_grandchild = forest.roots()[0].children[1].children[0].id.clone();

        let forest = forest.update_node(&root, &NodeDraft::new("T", "new q", 3), &mut ids);

        let root = &forest.roots()[0];
        assert_eq!(root.title, "T");
        assert_eq!(root.question, "new q");
        assert_eq!(
            titles(&root.children),
            vec!["Child 1 of T", "Child 2 of T", "Child 3 of T"]
        );
        assert!(!forest.contains(&custom_grandchild));
    }

    #[test]
    fn given_node_when_resizing_then_children_named_after_current_title() {
        let mut ids = SequentialIdSource::default();
        let forest = Forest::new().add_root(&NodeDraft::new("A", "Q?", 3), &mut ids);
        let root = forest.roots()[0].id.clone();

        let shrunk = forest.resize_children(&root, 1, &mut ids);
        assert_eq!(titles(&shrunk.roots()[0].children), vec!["Child 1 of A"]);

        let cleared = forest.resize_children(&root, 0, &mut ids);
        assert!(cleared.roots()[0].is_leaf());
        assert_eq!(cleared.roots()[0].title, "A");
    }

    #[test]
    fn given_leaf_child_when_deleting_then_removes_only_that_node() {
        let mut ids = SequentialIdSource::default();
        let forest = Forest::new().add_root(&NodeDraft::new("A", "Q?", 2), &mut ids);
        let first = forest.roots()[0].children[0].id.clone();

        let forest = forest.delete_node(&first);

        assert_eq!(titles(&forest.roots()[0].children), vec!["Child 2 of A"]);
        assert_eq!(forest.len(), 2);
        assert_eq!(forest.delete_node(&first), forest);
    }

    #[test]
    fn given_inner_node_when_deleting_then_removes_whole_subtree() {
        let mut ids = SequentialIdSource::default();
        let forest = Forest::new()
            .add_root(&NodeDraft::new("A", "Q?", 0), &mut ids)
            .add_root(&NodeDraft::new("B", "Q?", 2), &mut ids);
        let b = forest.roots()[1].id.clone();

        let forest = forest.delete_node(&b);

        assert_eq!(titles(forest.roots()), vec!["A"]);
        assert_eq!(forest.len(), 1);
    }

    #[test]
    fn given_duplicate_ids_when_deleting_then_all_occurrences_removed() {
        let forest = Forest::from_roots(vec![
            Node::new(1u64, "A", "q").with_children(vec![Node::new(5u64, "dup", "q")]),
            Node::new(2u64, "B", "q").with_children(vec![
                Node::new(3u64, "C", "q").with_children(vec![Node::new(5u64, "dup", "q")]),
            ]),
        ]);
        assert_eq!(forest.validate(), Err(DomainError::DuplicateId(NodeId::from(5u64))));

        let forest = forest.delete_node(&NodeId::from(5u64));
        assert_eq!(forest.len(), 3);
        assert!(forest.validate().is_ok());
    }

    #[test]
    fn given_forest_when_querying_then_reports_shape() {
        let mut ids = SequentialIdSource::starting_at(100);
        let forest = Forest::new()
            .add_root(&NodeDraft::new("A", "Q?", 2), &mut ids)
            .add_root(&NodeDraft::new("B", "Q?", 0), &mut ids);
        let child = forest.roots()[0].children[1].id.clone();
        let forest = forest.add_child(&child, &NodeDraft::new("D", "Q?", 0), &mut ids);

        assert_eq!(forest.len(), 5);
        assert_eq!(forest.depth(), 3);
        assert_eq!(
            forest.iter().map(|n| n.title.as_str()).collect::<Vec<_>>(),
            vec!["A", "Child 1 of A", "Child 2 of A", "D", "B"]
        );
        assert_eq!(
            forest.leaves().iter().map(|n| n.title.as_str()).collect::<Vec<_>>(),
            vec!["Child 1 of A", "D", "B"]
        );
        assert_eq!(forest.max_numeric_id(), Some(104));
    }
}

//! Nested-list rendering of a forest with `termtree`.

use termtree::Tree;

use crate::domain::{Forest, Node};

/// Shown instead of a tree when the forest has no nodes.
pub const EMPTY_FOREST_MESSAGE: &str = "No nodes available. Please add a node to get started.";

pub trait ToTermTree {
    fn to_term_tree(&self) -> Tree<String>;
}

impl ToTermTree for Node {
    fn to_term_tree(&self) -> Tree<String> {
        let leaves: Vec<_> = self.children.iter().map(|c| c.to_term_tree()).collect();
        Tree::new(node_label(self)).with_leaves(leaves)
    }
}

/// One-line label: `title [id]: question (n children)`.
pub fn node_label(node: &Node) -> String {
    let count = node.children.len();
    let noun = if count == 1 { "child" } else { "children" };
    format!(
        "{} [{}]: {} ({} {})",
        node.title, node.id, node.question, count, noun
    )
}

/// Render every root as its own tree, in order.
pub fn render_forest(forest: &Forest) -> String {
    if forest.is_empty() {
        return EMPTY_FOREST_MESSAGE.to_string();
    }
    forest
        .roots()
        .iter()
        .map(|root| root.to_term_tree().to_string())
        .collect::<Vec<_>>()
        .join("")
}

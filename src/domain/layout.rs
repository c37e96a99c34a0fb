//! Layout Engine: positions nodes and edges of a forest for a node-link diagram.
//!
//! Placement is a single depth-first pre-order pass. Each node sits one
//! `level_spacing` below its parent. Horizontally, the first node placed at a
//! depth is offset from its parent by its sibling index; every later node at
//! that depth, whatever its parent, goes `sibling_spacing` to the right of the
//! previous one. Nothing is cached between calls.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::{Forest, Node};

/// Spacing constants for the diagram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Vertical distance between a node and its parent
    pub level_spacing: f64,
    /// Horizontal distance between neighbours on one level
    pub sibling_spacing: f64,
    /// Position roots are measured from
    pub origin_x: f64,
    pub origin_y: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            level_spacing: 150.0,
            sibling_spacing: 200.0,
            origin_x: 500.0,
            origin_y: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Content the renderer shows inside a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeLabel {
    pub title: String,
    pub question: String,
    pub child_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedNode {
    pub id: String,
    pub position: Position,
    #[serde(rename = "data")]
    pub label: NodeLabel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEdge {
    /// `<parent>-<child>`
    pub id: String,
    pub source: String,
    pub target: String,
    pub animated: bool,
}

/// Output of [`layout`]: what the diagram renderer consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowLayout {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<FlowEdge>,
}

impl FlowLayout {
    pub fn node(&self, id: &str) -> Option<&PositionedNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Compute positions for every node of `forest` and an edge for every parent/child pair.
#[instrument(level = "debug", skip(forest), fields(roots = forest.roots().len()))]
pub fn layout(forest: &Forest, config: &LayoutConfig) -> FlowLayout {
    let origin = Position {
        x: config.origin_x,
        y: config.origin_y,
    };
    let mut pass = LayoutPass {
        config,
        last_x_at_level: Vec::new(),
        out: FlowLayout::default(),
    };
    for (index, root) in forest.roots().iter().enumerate() {
        pass.place(root, origin, 0, index);
    }
    pass.out
}

struct LayoutPass<'c> {
    config: &'c LayoutConfig,
    /// x of the most recently placed node per depth
    last_x_at_level: Vec<Option<f64>>,
    out: FlowLayout,
}

impl LayoutPass<'_> {
    fn place(&mut self, node: &Node, parent: Position, level: usize, sibling_index: usize) {
        if self.last_x_at_level.len() <= level {
            self.last_x_at_level.resize(level + 1, None);
        }
        let x = match self.last_x_at_level[level] {
            Some(last_x) => last_x + self.config.sibling_spacing,
            None => parent.x + sibling_index as f64 * self.config.sibling_spacing,
        };
        self.last_x_at_level[level] = Some(x);

        let position = Position {
            x,
            y: parent.y + self.config.level_spacing,
        };
        let id = node.id.to_string();
        self.out.nodes.push(PositionedNode {
            id: id.clone(),
            position,
            label: NodeLabel {
                title: node.title.clone(),
                question: node.question.clone(),
                child_count: node.children.len(),
            },
        });

        for (index, child) in node.children.iter().enumerate() {
            self.place(child, position, level + 1, index);
            let target = child.id.to_string();
            self.out.edges.push(FlowEdge {
                id: format!("{id}-{target}"),
                source: id.clone(),
                target,
                animated: true,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NodeId;

    fn leaf(id: u64, title: &str) -> Node {
        Node::new(id, title, "q")
    }

    #[test]
    fn given_empty_forest_when_laying_out_then_nothing_placed() {
        let out = layout(&Forest::new(), &LayoutConfig::default());
        assert!(out.nodes.is_empty());
        assert!(out.edges.is_empty());
    }

    #[test]
    fn given_single_root_when_laying_out_then_one_node_no_edges() {
        let forest = Forest::from_roots(vec![leaf(1, "A")]);
        let out = layout(&forest, &LayoutConfig::default());

        assert_eq!(out.nodes.len(), 1);
        assert!(out.edges.is_empty());
        assert_eq!(out.nodes[0].position, Position { x: 500.0, y: 150.0 });
    }

    #[test]
    fn given_root_with_two_children_when_laying_out_then_children_one_spacing_apart() {
        let forest = Forest::from_roots(vec![
            leaf(1, "A").with_children(vec![leaf(2, "B"), leaf(3, "C")])
        ]);
        let config = LayoutConfig::default();
        let out = layout(&forest, &config);

        assert_eq!(out.nodes.len(), 3);
        assert_eq!(out.edges.len(), 2);
        let b = out.node("2").unwrap().position;
        let c = out.node("3").unwrap().position;
        assert_eq!(c.x - b.x, config.sibling_spacing);
        assert_eq!(b, Position { x: 500.0, y: 300.0 });
        assert_eq!(out.edges[0].id, "1-2");
        assert_eq!(out.edges[1].source, "1");
        assert_eq!(out.edges[1].target, "3");
    }

    #[test]
    fn given_two_roots_when_laying_out_then_second_root_offset_by_index() {
        let forest = Forest::from_roots(vec![leaf(1, "A"), leaf(2, "B")]);
        let out = layout(&forest, &LayoutConfig::default());

        assert_eq!(out.nodes[0].position.x, 500.0);
        assert_eq!(out.nodes[1].position.x, 700.0);
        assert_eq!(out.nodes[1].position.y, 150.0);
    }

    #[test]
    fn given_cousins_when_laying_out_then_x_flows_across_parents() {
        // Depth 2 is shared by the children of both B and C
        let forest = Forest::from_roots(vec![leaf(1, "A").with_children(vec![
            leaf(2, "B").with_children(vec![leaf(4, "D"), leaf(5, "E")]),
            leaf(3, "C").with_children(vec![leaf(6, "F")]),
        ])]);
        let out = layout(&forest, &LayoutConfig::default());

        let x = |id: &str| out.node(id).unwrap().position.x;
        assert_eq!(x("2"), 500.0);
        assert_eq!(x("4"), 500.0);
        assert_eq!(x("5"), 700.0);
        assert_eq!(x("3"), 700.0);
        assert_eq!(x("6"), 900.0);
        assert_eq!(out.node("6").unwrap().position.y, 450.0);
    }

    #[test]
    fn given_nested_children_when_laying_out_then_edges_follow_subtree_completion() {
        let forest = Forest::from_roots(vec![leaf(1, "A").with_children(vec![
            leaf(2, "B").with_children(vec![leaf(3, "C")]),
            leaf(4, "D"),
        ])]);
        let out = layout(&forest, &LayoutConfig::default());

        let ids: Vec<&str> = out.edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["2-3", "1-2", "1-4"]);
        assert!(out.edges.iter().all(|e| e.animated));
    }

    #[test]
    fn given_text_ids_when_laying_out_then_ids_are_string_forms() {
        let forest = Forest::from_roots(vec![Node::new(NodeId::Text("root".into()), "A", "q")
            .with_children(vec![leaf(7, "B")])]);
        let out = layout(&forest, &LayoutConfig::default());

        assert_eq!(out.nodes[0].id, "root");
        assert_eq!(out.edges[0].id, "root-7");
        assert_eq!(out.nodes[0].label.child_count, 1);
    }

    #[test]
    fn given_layout_when_serializing_then_uses_renderer_field_names() {
        let forest = Forest::from_roots(vec![leaf(1, "A")]);
        let json = serde_json::to_value(layout(&forest, &LayoutConfig::default())).unwrap();

        assert_eq!(json["nodes"][0]["data"]["childCount"], 0);
        assert_eq!(json["nodes"][0]["position"]["x"], 500.0);
        assert!(json["edges"].as_array().unwrap().is_empty());
    }
}

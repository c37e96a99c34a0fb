//! Domain entities: core data structures

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a node in the forest.
///
/// Generated ids are always numeric. Persisted state may also carry string ids,
/// which are kept as they are: `7` and `"7"` are different ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Number(u64),
    Text(String),
}

impl NodeId {
    /// Numeric value of the id, if it has one.
    pub fn as_number(&self) -> Option<u64> {
        match self {
            NodeId::Number(n) => Some(*n),
            NodeId::Text(_) => None,
        }
    }

    /// The other reading of the same text: `7` <-> `"7"`.
    ///
    /// Command line input cannot say which one was meant.
    pub fn alternate(&self) -> Option<NodeId> {
        match self {
            NodeId::Number(n) => Some(NodeId::Text(n.to_string())),
            NodeId::Text(s) => s.parse::<u64>().ok().map(NodeId::Number),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Number(n) => write!(f, "{n}"),
            NodeId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        NodeId::Number(value)
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        NodeId::Text(value)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        NodeId::Text(value.to_string())
    }
}

/// Parses user input: plain non-negative integers become `Number`, anything else `Text`.
impl FromStr for NodeId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.parse::<u64>() {
            Ok(n) => NodeId::Number(n),
            Err(_) => NodeId::Text(s.to_string()),
        })
    }
}

/// A titled question/statement with ordered children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub title: String,
    pub question: String,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, title: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            question: question.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Copy of this node's own fields with a replacement child list.
    pub(crate) fn rebuilt(&self, children: Vec<Node>) -> Self {
        Self {
            id: self.id.clone(),
            title: self.title.clone(),
            question: self.question.clone(),
            children,
        }
    }
}

/// Ordered collection of root nodes; the whole persisted state.
///
/// Serializes as a bare JSON array of nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Forest {
    pub(crate) roots: Vec<Node>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_roots(roots: Vec<Node>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[Node] {
        &self.roots
    }

    /// True when the forest has no roots.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Input collected by the form: what a new or edited node should look like.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeDraft {
    pub title: String,
    pub question: String,
    /// Number of auto-generated children to create.
    pub child_count: usize,
}

impl NodeDraft {
    pub fn new(title: impl Into<String>, question: impl Into<String>, child_count: usize) -> Self {
        Self {
            title: title.into(),
            question: question.into(),
            child_count,
        }
    }

    /// Build a draft from raw form text, coercing the child count leniently.
    pub fn from_form(title: &str, question: &str, raw_child_count: &str) -> Self {
        Self::new(title, question, parse_child_count(raw_child_count))
    }
}

/// Lenient child count parsing.
///
/// Reads the leading integer of the input (`"3 nodes"` -> 3, `"2.7"` -> 2).
/// Empty, non-numeric, negative or overflowing input yields 0.
pub fn parse_child_count(raw: &str) -> usize {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if negative || digits.is_empty() {
        return 0;
    }
    digits.parse::<usize>().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("3", 3)]
    #[case("  4", 4)]
    #[case("2.7", 2)]
    #[case("5 children", 5)]
    #[case("+1", 1)]
    #[case("", 0)]
    #[case("abc", 0)]
    #[case("-3", 0)]
    #[case("99999999999999999999999999", 0)]
    fn given_raw_input_when_parsing_child_count_then_coerces(
        #[case] raw: &str,
        #[case] expected: usize,
    ) {
        assert_eq!(parse_child_count(raw), expected);
    }

    #[test]
    fn given_string_ids_when_deserializing_then_kept_as_text() {
        let id: NodeId = serde_json::from_str("\"1718000000000\"").unwrap();
        assert_eq!(id, NodeId::Text("1718000000000".to_string()));

        let id: NodeId = serde_json::from_str("1718000000000").unwrap();
        assert_eq!(id, NodeId::Number(1_718_000_000_000));
    }

    #[test]
    fn given_numeric_text_id_when_round_tripping_forest_then_deep_equal() {
        let forest = Forest::from_roots(vec![
            Node::new(NodeId::Text("42".into()), "A", "q"),
            Node::new(42u64, "B", "q"),
        ]);

        let json = serde_json::to_string(&forest).unwrap();
        let back: Forest = serde_json::from_str(&json).unwrap();

        assert_eq!(back, forest);
        assert!(back.validate().is_ok(), "42 and \"42\" are distinct ids");
    }

    #[rstest]
    #[case("7", NodeId::Number(7))]
    #[case(" 7 ", NodeId::Number(7))]
    #[case("root-a", NodeId::Text("root-a".to_string()))]
    fn given_cli_input_when_parsing_id_then_prefers_number(
        #[case] raw: &str,
        #[case] expected: NodeId,
    ) {
        assert_eq!(raw.parse::<NodeId>().unwrap(), expected);
    }

    #[test]
    fn given_id_when_taking_alternate_then_swaps_reading() {
        assert_eq!(NodeId::from(7u64).alternate(), Some(NodeId::from("7")));
        assert_eq!(NodeId::from("7").alternate(), Some(NodeId::from(7u64)));
        assert_eq!(NodeId::from("x").alternate(), None);
    }

    #[test]
    fn given_node_without_children_field_when_deserializing_then_defaults_empty() {
        let node: Node = serde_json::from_str(r#"{"id":1,"title":"A","question":"Q?"}"#).unwrap();
        assert!(node.is_leaf());
    }

    #[test]
    fn given_forest_when_serializing_then_writes_bare_array() {
        let forest = Forest::from_roots(vec![Node::new(7u64, "A", "Q?")]);
        let json = serde_json::to_string(&forest).unwrap();
        assert_eq!(json, r#"[{"id":7,"title":"A","question":"Q?","children":[]}]"#);
    }
}

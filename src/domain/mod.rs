//! Domain layer: the question tree model, its operations and layout
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod entities;
pub mod error;
pub mod ids;
pub mod layout;
pub mod render;
pub mod tree;

pub use entities::{parse_child_count, Forest, Node, NodeDraft, NodeId};
pub use error::{DomainError, DomainResult};
pub use ids::{ClockIdSource, IdSource, SequentialIdSource};
pub use layout::{layout, FlowEdge, FlowLayout, LayoutConfig, NodeLabel, Position, PositionedNode};
pub use render::{render_forest, ToTermTree};
pub use tree::{generate_children, PreOrder};

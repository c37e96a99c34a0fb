//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::NodeId;

/// Domain errors represent violations of the tree model or of form input.
///
/// Tree Store operations themselves never fail: an unknown id is a no-op.
/// These errors come from validation and from explicit lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("question must not be empty")]
    EmptyQuestion,

    #[error("duplicate node id in forest: {0}")]
    DuplicateId(NodeId),

    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("node {0} has children; delete them first or delete recursively")]
    HasChildren(NodeId),

    #[error("too many children requested: {requested} (max {max})")]
    TooManyChildren { requested: usize, max: usize },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

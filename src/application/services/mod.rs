//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (KeyValueStore, FileSystem)
//! but are themselves concrete structs, not traits.

mod tree;

pub use tree::{FormMode, Mutation, TreeService};

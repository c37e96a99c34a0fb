//! qtree: build, edit and lay out trees of question nodes.
//!
//! - `domain`: the forest model, copy-on-write Tree Store operations, layout and rendering
//! - `application`: the `TreeService` session and forest persistence
//! - `infrastructure`: key-value stores, filesystem access, dependency wiring
//! - `cli`: command line front end

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use crate::domain::NodeId;

/// Build, edit and lay out trees of question nodes
#[derive(Parser, Debug)]
#[command(name = "qtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory holding the stored forest (overrides config and QTREE_DATA_DIR)
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a node (a root unless --parent is given)
    Add {
        /// Parent node id
        #[arg(short, long)]
        parent: Option<NodeId>,
        /// Node title
        #[arg(short, long, default_value = "")]
        title: String,
        /// Question or statement (required, must not be blank)
        #[arg(short, long)]
        question: String,
        /// Number of auto-generated children; non-numeric input counts as 0
        #[arg(short, long, default_value = "0")]
        children: String,
    },

    /// Edit a node; its children are replaced by fresh placeholders
    Edit {
        /// Node id
        id: NodeId,
        /// New title (default: current)
        #[arg(short, long)]
        title: Option<String>,
        /// New question (default: current)
        #[arg(short, long)]
        question: Option<String>,
        /// Number of children to generate (default: current count)
        #[arg(short, long)]
        children: Option<String>,
    },

    /// Replace a node's children with COUNT placeholders
    Resize {
        /// Node id
        id: NodeId,
        /// New number of children; non-numeric input counts as 0
        count: String,
    },

    /// Delete a leaf node
    Delete {
        /// Node id
        id: NodeId,
        /// Also delete a node that has children, with its subtree
        #[arg(short, long)]
        recursive: bool,
    },

    /// Show the forest as a nested list
    Show,

    /// Print diagram positions and edges as JSON
    Layout {
        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// Print the stored forest JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings as TOML
    Show,
    /// Print a commented config template
    Template,
    /// Show config and data file locations
    Path,
}

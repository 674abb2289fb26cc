//! CLI parse: clap types for merkle-sync. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// merkle-sync CLI - versioned sparse Merkle tree storage
#[derive(Parser)]
#[command(name = "merkle-sync")]
#[command(about = "Versioned sparse Merkle tree storage with batched leaf synchronization")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (for config/config.toml lookup)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Store directory (overrides storage.path)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Logical database name (overrides tree.database)
    #[arg(long)]
    pub database: Option<String>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create the tree with a fixed height
    Create {
        /// Tree height (defaults to tree.default_height)
        #[arg(long)]
        height: Option<u32>,
    },
    /// Queue a raw leaf hash at an index
    AddLeaf {
        #[arg(long)]
        index: u64,
        /// 32-byte hash, hex encoded
        #[arg(long)]
        hash: String,
    },
    /// Allocate a leaf for new content and queue its hash
    AddDocument {
        /// Document content
        content: String,
    },
    /// Queue the empty-leaf hash at an index
    RemoveDocument {
        #[arg(long)]
        index: u64,
    },
    /// Build pending leaves into the tree
    Build {
        /// Maximum leaves to build (defaults to tree.build_batch_size)
        #[arg(long)]
        amount: Option<usize>,
    },
    /// Show the tree height
    Height,
    /// List committed roots
    Roots {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List pending leaves, oldest first
    Pending {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Show a node as of a committed root
    Node {
        #[arg(long)]
        root: String,
        #[arg(long)]
        level: u32,
        #[arg(long)]
        index: u64,
    },
    /// Show the witness of a leaf under a committed root
    Witness {
        #[arg(long)]
        root: String,
        #[arg(long)]
        index: u64,
    },
    /// Allocate and print the next leaf index
    NextIndex,
    /// Show height, latest root, pending leaves, and the next free leaf index
    Status,
    /// Run scheduled builds until interrupted
    Watch {
        /// Interval between builds in milliseconds (defaults to tree.build_interval_ms)
        #[arg(long)]
        interval_ms: Option<u64>,
    },
}

//! Merkle Sync: Versioned Sparse Merkle Tree Storage
//!
//! Keeps every document of a database at a fixed leaf of a height-bounded
//! sparse Merkle tree. Leaf updates queue in a durable pool and are built into
//! the tree in atomic batches; every committed root is recorded so nodes and
//! witnesses can be read exactly as they were at any earlier root.

pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod pool;
pub mod scheduler;
pub mod sequencer;
pub mod service;
pub mod store;
pub mod tree;
pub mod types;

pub use error::{StorageError, SyncError};
pub use service::{BuildReport, MerkleTreeService, TreeState};

//! Merkle Tree Engine
//!
//! Computes node values of a fixed-height sparse Merkle tree on top of the
//! versioned [`NodeStore`]. Nodes that were never written read as the default
//! hash of their level, so an empty tree costs no storage at all.
//!
//! Updates are applied as a batch: every leaf of a batch is written at one
//! shared version, then each dirty ancestor is recomputed exactly once, level
//! by level, from children read at that same version. The resulting root is
//! therefore a function of the set of `(index, hash)` pairs, not of the order
//! they were supplied in.

pub mod hasher;
pub mod witness;

pub use witness::{Witness, WitnessStep};

use crate::error::SyncError;
use crate::store::{KvAccess, KvScan, NodeStore};
use crate::types::{Hash, LeafIndex, NodeKey, Version, MAX_HEIGHT};
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// Height-aware view over a node store.
///
/// Holds no node data itself; the only state is the configured height and
/// the default hash of each level, computed once.
#[derive(Debug, Clone)]
pub struct MerkleTreeEngine {
    height: u32,
    defaults: Vec<Hash>,
}

impl MerkleTreeEngine {
    pub fn new(height: u32) -> Result<Self, SyncError> {
        validate_height(height)?;
        Ok(Self {
            height,
            defaults: hasher::default_hashes(height),
        })
    }

    /// Reconfigure the working height. Does not touch storage.
    pub fn set_height(&mut self, height: u32) -> Result<(), SyncError> {
        validate_height(height)?;
        if height != self.height {
            self.height = height;
            self.defaults = hasher::default_hashes(height);
        }
        Ok(())
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of leaves, `2^(height-1)`.
    pub fn capacity(&self) -> u64 {
        1u64 << (self.height - 1)
    }

    /// Value of any never-written node at `level`.
    pub fn default_hash(&self, level: u32) -> Option<Hash> {
        self.defaults.get(level as usize).copied()
    }

    /// Root of a tree in which no leaf has been written.
    pub fn empty_root(&self) -> Hash {
        self.defaults[(self.height - 1) as usize]
    }

    pub fn check_index(&self, index: LeafIndex) -> Result<(), SyncError> {
        if index >= self.capacity() {
            return Err(SyncError::IndexOutOfRange {
                index,
                capacity: self.capacity(),
            });
        }
        Ok(())
    }

    pub fn check_node(&self, level: u32, index: u64) -> Result<(), SyncError> {
        if level >= self.height {
            return Err(SyncError::LevelOutOfRange {
                level,
                height: self.height,
            });
        }
        let width = 1u64 << (self.height - 1 - level);
        if index >= width {
            return Err(SyncError::IndexOutOfRange {
                index,
                capacity: width,
            });
        }
        Ok(())
    }

    /// Node value valid at or before `as_of`, or the level default.
    pub fn get_node<S: KvScan>(
        &self,
        nodes: &NodeStore<S>,
        level: u32,
        index: u64,
        as_of: Version,
    ) -> Result<Hash, S::Error> {
        self.check_node(level, index)?;
        let stored = nodes.value_as_of(NodeKey::new(level, index), as_of)?;
        Ok(stored.unwrap_or(self.defaults[level as usize]))
    }

    pub fn root<S: KvScan>(&self, nodes: &NodeStore<S>, as_of: Version) -> Result<Hash, S::Error> {
        self.get_node(nodes, self.height - 1, 0, as_of)
    }

    /// Newest value of a node, or the level default.
    fn current_node<S: KvAccess>(&self, nodes: &NodeStore<S>, level: u32, index: u64) -> Result<Hash, S::Error> {
        let stored = nodes.latest(NodeKey::new(level, index))?;
        Ok(stored.map_or(self.defaults[level as usize], |entry| entry.value))
    }

    /// Write a single leaf at version `at` and return the new root.
    pub fn set_leaf<S: KvAccess>(
        &self,
        nodes: &NodeStore<S>,
        index: LeafIndex,
        hash: Hash,
        at: Version,
    ) -> Result<Hash, S::Error> {
        self.set_leaves(nodes, [(index, hash)], at)
    }

    /// Write a batch of leaves at version `at` and return the new root.
    ///
    /// If an index appears more than once, the last occurrence wins. `at`
    /// must not be older than any version already written: children are read
    /// from the latest records, which is the state as of `at`.
    pub fn set_leaves<S, I>(&self, nodes: &NodeStore<S>, leaves: I, at: Version) -> Result<Hash, S::Error>
    where
        S: KvAccess,
        I: IntoIterator<Item = (LeafIndex, Hash)>,
    {
        let mut batch = BTreeMap::new();
        for (index, hash) in leaves {
            self.check_index(index)?;
            batch.insert(index, hash);
        }

        let mut dirty = BTreeSet::new();
        for (&index, &hash) in &batch {
            nodes.record(NodeKey::new(0, index), at, hash)?;
            dirty.insert(index);
        }

        for level in 1..self.height {
            let parents: BTreeSet<u64> = dirty.iter().map(|index| index >> 1).collect();
            for &parent in &parents {
                let left = self.current_node(nodes, level - 1, parent << 1)?;
                let right = self.current_node(nodes, level - 1, (parent << 1) | 1)?;
                nodes.record(NodeKey::new(level, parent), at, hasher::hash_pair(&left, &right))?;
            }
            trace!(level, recomputed = parents.len(), "Recomputed dirty ancestors");
            dirty = parents;
        }

        self.current_node(nodes, self.height - 1, 0)
    }

    /// Authentication path for leaf `index` as of version `as_of`.
    pub fn witness<S: KvScan>(
        &self,
        nodes: &NodeStore<S>,
        index: LeafIndex,
        as_of: Version,
    ) -> Result<Witness, S::Error> {
        self.check_index(index)?;
        let mut path = Vec::with_capacity((self.height - 1) as usize);
        let mut current = index;
        for level in 0..self.height - 1 {
            let sibling_is_left = current & 1 == 1;
            let sibling = self.get_node(nodes, level, current ^ 1, as_of)?;
            path.push(WitnessStep {
                sibling,
                sibling_is_left,
            });
            current >>= 1;
        }
        Ok(Witness { path })
    }
}

fn validate_height(height: u32) -> Result<(), SyncError> {
    if height == 0 || height > MAX_HEIGHT {
        return Err(SyncError::InvalidHeight(height));
    }
    Ok(())
}

//! Leaf Pool
//!
//! Durable queue of leaf updates waiting to be built into the tree. Entries
//! are keyed by leaf index, so a second submission for the same index
//! replaces the first (last write wins). A secondary index orders entries by
//! submission sequence; `get_oldest_leaves` walks it from the front, which is
//! what gives the longest-waiting leaves priority in the next build.

use crate::error::SyncError;
use crate::sequencer::Sequencer;
use crate::store::{decode_u64, read_record, write_record, KvAccess, Storage};
use crate::store::{PENDING_LEAVES, PENDING_ORDER};
use crate::types::{Hash, LeafIndex};
use serde::{Deserialize, Serialize};
use sled::Transactional;

/// Sequencer key that orders pool submissions.
pub const POOL_SUBMISSION_KEY: &str = "pool-submission";

/// A leaf update awaiting incorporation into the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLeaf {
    pub index: LeafIndex,
    pub hash: Hash,
    /// Submission sequence; the ordering key of the pool.
    pub seq: u64,
    /// Wall-clock submission time (milliseconds since epoch), for display only.
    pub submitted_at_ms: i64,
}

pub struct LeafPool<S = sled::Tree> {
    entries: S,
    order: S,
}

impl<S: KvAccess> LeafPool<S> {
    pub fn new(entries: S, order: S) -> Self {
        Self { entries, order }
    }

    pub fn get(&self, index: LeafIndex) -> Result<Option<PendingLeaf>, S::Error> {
        read_record(&self.entries, PENDING_LEAVES, &index.to_be_bytes())
    }

    /// Insert or replace the pending entry for `leaf.index`.
    pub fn upsert(&self, leaf: &PendingLeaf) -> Result<(), S::Error> {
        if let Some(previous) = self.get(leaf.index)? {
            self.order.delete(&previous.seq.to_be_bytes())?;
        }
        write_record(&self.entries, PENDING_LEAVES, &leaf.index.to_be_bytes(), leaf)?;
        self.order
            .write(&leaf.seq.to_be_bytes(), leaf.index.to_be_bytes().to_vec())
    }

    /// Delete exactly the given entries.
    ///
    /// An entry that was resubmitted since it was read carries a newer
    /// sequence and is kept: the newer value still has to be built.
    pub fn remove_leaves(&self, leaves: &[PendingLeaf]) -> Result<usize, S::Error> {
        let mut removed = 0;
        for leaf in leaves {
            match self.get(leaf.index)? {
                Some(current) if current.seq == leaf.seq => {
                    self.entries.delete(&leaf.index.to_be_bytes())?;
                    self.order.delete(&leaf.seq.to_be_bytes())?;
                    removed += 1;
                }
                _ => {}
            }
        }
        Ok(removed)
    }
}

impl LeafPool<sled::Tree> {
    pub fn open(storage: &Storage, database: &str) -> Result<Self, SyncError> {
        Ok(Self::new(
            storage.open_tree(database, PENDING_LEAVES)?,
            storage.open_tree(database, PENDING_ORDER)?,
        ))
    }

    /// Queue `hash` for leaf `index`, moving it to the back of the order.
    pub fn save_leaf(
        &self,
        clock: &Sequencer,
        index: LeafIndex,
        hash: Hash,
    ) -> Result<PendingLeaf, SyncError> {
        let leaf = PendingLeaf {
            index,
            hash,
            seq: clock.next(POOL_SUBMISSION_KEY)?,
            submitted_at_ms: chrono::Utc::now().timestamp_millis(),
        };
        (&self.entries, &self.order).transaction(|(entries, order)| {
            LeafPool::new(entries, order).upsert(&leaf)
        })?;
        Ok(leaf)
    }

    /// Up to `limit` entries, oldest submission first.
    pub fn get_oldest_leaves(&self, limit: usize) -> Result<Vec<PendingLeaf>, SyncError> {
        let mut leaves = Vec::with_capacity(limit.min(1024));
        for item in self.order.iter() {
            if leaves.len() >= limit {
                break;
            }
            let (seq, index) = item?;
            let seq = decode_u64(PENDING_ORDER, &seq)?;
            let index = decode_u64(PENDING_ORDER, &index)?;
            // The order entry may belong to a submission replaced after iteration began.
            if let Some(leaf) = self.get(index)? {
                if leaf.seq == seq {
                    leaves.push(leaf);
                }
            }
        }
        Ok(leaves)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn trees(&self) -> (&sled::Tree, &sled::Tree) {
        (&self.entries, &self.order)
    }
}

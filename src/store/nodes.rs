//! Node Store
//!
//! Every node `(level, index)` has a fixed-size latest record in `nodes`
//! and one entry per historical value in `node_history`, keyed by the node
//! key followed by the big-endian version at which the value became current.
//! The value "as of" version `v` is the latest entry with `version <= v`.
//!
//! Builds only ever read and write at the newest version, so they touch the
//! latest records plus one appended history key per changed node; the cost
//! of a write does not depend on how many versions came before it. Older
//! versions are answered by a reverse range scan over the history keys.

use crate::error::{StorageError, SyncError};
use crate::store::{read_record, write_record, KvAccess, KvScan, Storage, NODES, NODE_HISTORY};
use crate::types::{Hash, NodeKey, Version};
use serde::{Deserialize, Serialize};

/// The current value of a node and the version it was written at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub version: Version,
    pub value: Hash,
}

/// Versioned node storage over any [`KvAccess`] backend.
#[derive(Clone)]
pub struct NodeStore<S = sled::Tree> {
    latest: S,
    history: S,
}

fn history_key(key: NodeKey, version: Version) -> [u8; 17] {
    let mut out = [0u8; 17];
    out[..9].copy_from_slice(&key.encode());
    out[9..].copy_from_slice(&version.to_be_bytes());
    out
}

fn decode_hash(bytes: &[u8]) -> Result<Hash, SyncError> {
    bytes.try_into().map_err(|_| {
        SyncError::Storage(StorageError::Corrupt {
            collection: NODE_HISTORY,
            reason: format!("expected 32-byte hash, found {} bytes", bytes.len()),
        })
    })
}

impl<S: KvAccess> NodeStore<S> {
    pub fn new(latest: S, history: S) -> Self {
        Self { latest, history }
    }

    /// Newest recorded value of a node, if it was ever written.
    pub fn latest(&self, key: NodeKey) -> Result<Option<NodeEntry>, S::Error> {
        read_record(&self.latest, NODES, &key.encode())
    }

    /// Record `value` as the node's value from `version` on.
    ///
    /// Returns whether anything was written. Writing the current value again
    /// is a no-op; a second write at the latest version replaces it in place;
    /// a version older than the latest is rejected.
    pub fn record(&self, key: NodeKey, version: Version, value: Hash) -> Result<bool, S::Error> {
        if let Some(latest) = self.latest(key)? {
            if version < latest.version {
                return Err(SyncError::MonotonicityViolation {
                    latest: latest.version,
                    attempted: version,
                }
                .into());
            }
            if latest.value == value {
                return Ok(false);
            }
        }
        write_record(&self.latest, NODES, &key.encode(), &NodeEntry { version, value })?;
        self.history.write(&history_key(key, version), value.to_vec())?;
        Ok(true)
    }
}

impl<S: KvScan> NodeStore<S> {
    /// Value valid at or before `version`, if the node had been written by then.
    pub fn value_as_of(&self, key: NodeKey, version: Version) -> Result<Option<Hash>, S::Error> {
        match self.latest(key)? {
            None => Ok(None),
            Some(entry) if entry.version <= version => Ok(Some(entry.value)),
            Some(_) => {
                let low = history_key(key, 0);
                let high = history_key(key, version);
                match self.history.last_in(&low, &high)? {
                    Some((_, bytes)) => Ok(Some(decode_hash(&bytes)?)),
                    None => Ok(None),
                }
            }
        }
    }
}

impl NodeStore<sled::Tree> {
    pub fn open(storage: &Storage, database: &str) -> Result<Self, SyncError> {
        Ok(Self::new(
            storage.open_tree(database, NODES)?,
            storage.open_tree(database, NODE_HISTORY)?,
        ))
    }

    pub(crate) fn trees(&self) -> (&sled::Tree, &sled::Tree) {
        (&self.latest, &self.history)
    }

    /// All recorded values of a node, oldest first.
    #[cfg(test)]
    pub(crate) fn history(&self, key: NodeKey) -> Result<Vec<NodeEntry>, SyncError> {
        let mut out = Vec::new();
        for item in self.history.scan_prefix(key.encode()) {
            let (k, v) = item?;
            out.push(NodeEntry {
                version: crate::store::decode_u64(NODE_HISTORY, &k[9..])?,
                value: decode_hash(&v)?,
            });
        }
        Ok(out)
    }
}

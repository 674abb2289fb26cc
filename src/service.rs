//! Synchronization Service
//!
//! The entry point callers use for one tree. It owns the node store, leaf
//! pool, root ledger, and sequencer of a logical database and coordinates
//! them: creating the tree, building pending leaves into it, and answering
//! root-addressed node and witness queries.
//!
//! `build` runs as a single sled transaction spanning the node, ledger, and
//! pool trees, so a batch is either fully reflected in the tree, the ledger,
//! and the pool, or not at all. Builds on one service are serialized by a
//! build lock; queries do not take it, since they only read versions that
//! were committed before they started.

use crate::error::SyncError;
use crate::ledger::{RootLedger, RootRecord};
use crate::pool::{LeafPool, PendingLeaf};
use crate::sequencer::Sequencer;
use crate::store::{NodeStore, Storage, SEQUENCER};
use crate::tree::{MerkleTreeEngine, Witness};
use crate::types::{hash_to_hex, Hash, LeafIndex, MERKLE_INDEX_KEY};
use parking_lot::{Mutex, RwLock};
use sled::transaction::ConflictableTransactionError;
use sled::Transactional;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument};

/// Lifecycle of a tree handle.
#[derive(Debug, Clone)]
pub enum TreeState {
    /// No height recorded for this database yet.
    Uninitialized,
    /// Height known; engine configured.
    Ready(Arc<MerkleTreeEngine>),
}

/// Outcome of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Pool entries folded into the tree.
    pub leaves_applied: usize,
    /// Pool entries removed; lower than `leaves_applied` if some were resubmitted mid-build.
    pub leaves_removed: usize,
    /// Root after the build.
    pub root: Hash,
    /// Record appended by this build; `None` when the pool was empty.
    pub record: Option<RootRecord>,
}

pub struct MerkleTreeService {
    database: String,
    nodes: NodeStore,
    pool: LeafPool,
    ledger: RootLedger,
    sequencer: Sequencer,
    state: RwLock<TreeState>,
    build_lock: Mutex<()>,
    #[cfg(test)]
    fail_before_pool_removal: std::sync::atomic::AtomicBool,
}

impl MerkleTreeService {
    /// Open the tree of `database`, hydrating its height if it was created before.
    pub fn open(storage: &Storage, database: &str) -> Result<Self, SyncError> {
        let service = Self {
            database: database.to_string(),
            nodes: NodeStore::open(storage, database)?,
            pool: LeafPool::open(storage, database)?,
            ledger: RootLedger::open(storage, database)?,
            sequencer: Sequencer::new(storage.open_tree(database, SEQUENCER)?),
            state: RwLock::new(TreeState::Uninitialized),
            build_lock: Mutex::new(()),
            #[cfg(test)]
            fail_before_pool_removal: std::sync::atomic::AtomicBool::new(false),
        };
        service.init()?;
        Ok(service)
    }

    /// Load the height from the root ledger, if present.
    pub fn init(&self) -> Result<(), SyncError> {
        if let Some(height) = self.ledger.get_height()? {
            let engine = MerkleTreeEngine::new(height)?;
            *self.state.write() = TreeState::Ready(Arc::new(engine));
            debug!(database = %self.database, height, "Hydrated tree height");
        }
        Ok(())
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn state(&self) -> TreeState {
        self.state.read().clone()
    }


    fn engine(&self) -> Result<Arc<MerkleTreeEngine>, SyncError> {
        if let TreeState::Ready(engine) = &*self.state.read() {
            return Ok(Arc::clone(engine));
        }
        // Another handle on the same database may have created the tree.
        self.init()?;
        match &*self.state.read() {
            TreeState::Ready(engine) => Ok(Arc::clone(engine)),
            TreeState::Uninitialized => Err(SyncError::NotCreated(self.database.clone())),
        }
    }

    /// Create the tree with a fixed `height` and record its empty root.
    #[instrument(skip(self), fields(database = %self.database))]
    pub fn create(&self, height: u32) -> Result<RootRecord, SyncError> {
        let _guard = self.build_lock.lock();
        if self.ledger.get_height()?.is_some() {
            return Err(SyncError::AlreadyExists(self.database.clone()));
        }
        let engine = MerkleTreeEngine::new(height)?;
        let root = engine.empty_root();
        let committed_at_ms = chrono::Utc::now().timestamp_millis();
        let database = self.database.as_str();

        let (roots, by_root, meta) = self.ledger.trees();
        let record = (roots, by_root, meta).transaction(|(roots, by_root, meta)| {
            let ledger = RootLedger::new(database, roots, by_root, meta);
            ledger.set_initial_height(height)?;
            let record = ledger.create_metadata(root, 0, committed_at_ms)?;
            Ok::<_, ConflictableTransactionError<SyncError>>(record)
        })?;

        *self.state.write() = TreeState::Ready(Arc::new(engine));
        info!(height, root = %hash_to_hex(&root), "Merkle tree created");
        Ok(record)
    }

    pub fn get_height(&self) -> Result<Option<u32>, SyncError> {
        self.ledger.get_height()
    }

    /// Build up to `amount` pending leaves; `false` on any failure.
    ///
    /// A failed build leaves the tree, ledger, and pool exactly as they were,
    /// so the caller may simply retry.
    pub fn build(&self, amount: usize) -> bool {
        match self.try_build(amount) {
            Ok(_) => true,
            Err(e) => {
                error!(database = %self.database, error = %e, "Error during build");
                false
            }
        }
    }

    /// Build up to `amount` of the oldest pending leaves as one atomic unit.
    #[instrument(skip(self), fields(database = %self.database))]
    pub fn try_build(&self, amount: usize) -> Result<BuildReport, SyncError> {
        let _guard = self.build_lock.lock();
        let start = Instant::now();
        let engine = self.engine()?;

        let leaves = self.pool.get_oldest_leaves(amount)?;
        if leaves.is_empty() {
            let root = match self.ledger.latest()? {
                Some(record) => record.root,
                None => engine.empty_root(),
            };
            debug!("Leaf pool empty, nothing to build");
            return Ok(BuildReport {
                leaves_applied: 0,
                leaves_removed: 0,
                root,
                record: None,
            });
        }

        info!(leaf_count = leaves.len(), "Starting build");
        let committed_at_ms = chrono::Utc::now().timestamp_millis();
        let database = self.database.as_str();
        let engine = engine.as_ref();
        let leaves = leaves.as_slice();
        #[cfg(test)]
        let inject_fault = self
            .fail_before_pool_removal
            .load(std::sync::atomic::Ordering::SeqCst);

        let (roots, by_root, meta) = self.ledger.trees();
        let (entries, order) = self.pool.trees();
        let (latest, history) = self.nodes.trees();
        let report = (latest, history, roots, by_root, meta, entries, order).transaction(
            |(latest, history, roots, by_root, meta, entries, order)| {
                let nodes = NodeStore::new(latest, history);
                let ledger = RootLedger::new(database, roots, by_root, meta);
                let pool = LeafPool::new(entries, order);

                let version = ledger.latest_version()?.map_or(0, |v| v + 1);
                let root = engine.set_leaves(&nodes, leaves.iter().map(|l| (l.index, l.hash)), version)?;
                let record = ledger.create_metadata(root, version, committed_at_ms)?;

                #[cfg(test)]
                if inject_fault {
                    return Err(SyncError::Storage(crate::error::StorageError::Backend(
                        "injected fault before pool removal".to_string(),
                    ))
                    .into());
                }

                let leaves_removed = pool.remove_leaves(leaves)?;
                Ok::<_, ConflictableTransactionError<SyncError>>(BuildReport {
                    leaves_applied: leaves.len(),
                    leaves_removed,
                    root,
                    record: Some(record),
                })
            },
        )?;

        info!(
            leaf_count = report.leaves_applied,
            removed = report.leaves_removed,
            root = %hash_to_hex(&report.root),
            version = report.record.as_ref().map(|r| r.version),
            duration_ms = start.elapsed().as_millis(),
            "Build completed"
        );
        Ok(report)
    }

    /// Authentication path of leaf `index` under the committed `root`.
    pub fn get_witness(&self, root: &Hash, index: LeafIndex) -> Result<Witness, SyncError> {
        let engine = self.engine()?;
        let record = self.ledger.require_root(root)?;
        engine.witness(&self.nodes, index, record.version)
    }

    /// Value of node `(level, index)` as it was when `root` was committed.
    pub fn get_node(&self, root: &Hash, level: u32, index: u64) -> Result<Hash, SyncError> {
        let engine = self.engine()?;
        let record = self.ledger.require_root(root)?;
        engine.get_node(&self.nodes, level, index, record.version)
    }

    /// Queue `hash` for leaf `index`; it is applied by a later build.
    pub fn add_leaf_to_pool(&self, index: LeafIndex, hash: Hash) -> Result<PendingLeaf, SyncError> {
        self.engine()?.check_index(index)?;
        let leaf = self.pool.save_leaf(&self.sequencer, index, hash)?;
        debug!(database = %self.database, index, seq = leaf.seq, "Leaf queued");
        Ok(leaf)
    }

    /// Allocate the next unused leaf index.
    pub fn next_leaf_index(&self) -> Result<LeafIndex, SyncError> {
        let engine = self.engine()?;
        let index = self.sequencer.next(MERKLE_INDEX_KEY)?;
        engine.check_index(index)?;
        Ok(index)
    }

    /// Leaf index the next allocation would return, without consuming it.
    pub fn peek_leaf_index(&self) -> Result<LeafIndex, SyncError> {
        self.sequencer.peek(MERKLE_INDEX_KEY)
    }

    pub fn latest_root(&self) -> Result<Option<RootRecord>, SyncError> {
        self.ledger.latest()
    }

    pub fn root_records(&self) -> Result<Vec<RootRecord>, SyncError> {
        self.ledger.records()
    }

    pub fn pending_leaves(&self, limit: usize) -> Result<Vec<PendingLeaf>, SyncError> {
        self.pool.get_oldest_leaves(limit)
    }

    pub fn pending_count(&self) -> usize {
        self.pool.len()
    }

    #[cfg(test)]
    fn inject_fault_before_pool_removal(&self, enabled: bool) {
        self.fail_before_pool_removal
            .store(enabled, std::sync::atomic::Ordering::SeqCst);
    }
}

//! Document leaf writer
//!
//! The document-store side of the tree: every stored document occupies one
//! leaf. A new document draws its leaf index from the sequencer and queues
//! the hash of its content; an update re-queues the same index; a deletion
//! queues the empty-leaf hash so the position reads as unwritten again.

use crate::error::SyncError;
use crate::pool::PendingLeaf;
use crate::service::MerkleTreeService;
use crate::tree::hasher::compute_content_hash;
use crate::types::{LeafIndex, EMPTY_LEAF};

pub struct DocumentLeafWriter<'a> {
    service: &'a MerkleTreeService,
}

impl<'a> DocumentLeafWriter<'a> {
    pub fn new(service: &'a MerkleTreeService) -> Self {
        Self { service }
    }

    /// Allocate a leaf for a new document and queue its content hash.
    pub fn index_document(&self, content: &[u8]) -> Result<PendingLeaf, SyncError> {
        let index = self.service.next_leaf_index()?;
        self.service
            .add_leaf_to_pool(index, compute_content_hash(content))
    }

    pub fn update_document(&self, index: LeafIndex, content: &[u8]) -> Result<PendingLeaf, SyncError> {
        self.service
            .add_leaf_to_pool(index, compute_content_hash(content))
    }

    pub fn remove_document(&self, index: LeafIndex) -> Result<PendingLeaf, SyncError> {
        self.service.add_leaf_to_pool(index, EMPTY_LEAF)
    }
}

//! Shared test utilities for integration tests

use merkle_sync::store::Storage;
use merkle_sync::tree::hasher::compute_content_hash;
use merkle_sync::types::Hash;
use merkle_sync::MerkleTreeService;
use tempfile::TempDir;

/// On-disk store plus an opened service; the directory lives as long as this value.
pub struct TestTree {
    pub dir: TempDir,
    pub storage: Storage,
    pub service: MerkleTreeService,
}

impl TestTree {
    pub fn new(height: u32) -> Self {
        let dir = TempDir::new().unwrap();
        let storage = Storage::open(dir.path().join("store")).unwrap();
        let service = MerkleTreeService::open(&storage, "testdb").unwrap();
        service.create(height).unwrap();
        Self {
            dir,
            storage,
            service,
        }
    }
}

/// Deterministic stand-in for a document hash.
pub fn leaf_hash(n: u64) -> Hash {
    compute_content_hash(&n.to_be_bytes())
}

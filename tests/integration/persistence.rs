//! Durability across reopen

use super::test_utils::leaf_hash;
use merkle_sync::store::Storage;
use merkle_sync::{MerkleTreeService, TreeState};
use tempfile::TempDir;

#[test]
fn test_tree_and_pool_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store");

    let built_root = {
        let storage = Storage::open(&path).unwrap();
        let service = MerkleTreeService::open(&storage, "docs").unwrap();
        service.create(12).unwrap();
        for i in 6..100u64 {
            service.add_leaf_to_pool(i, leaf_hash(i)).unwrap();
        }
        let root = service.try_build(50).unwrap().root;
        storage.flush().unwrap();
        root
    };

    let storage = Storage::open(&path).unwrap();
    let service = MerkleTreeService::open(&storage, "docs").unwrap();
    assert!(matches!(service.state(), TreeState::Ready(_)));
    assert_eq!(service.get_height().unwrap(), Some(12));
    assert_eq!(service.latest_root().unwrap().unwrap().root, built_root);
    assert_eq!(service.pending_count(), 44);

    let final_root = service.try_build(100).unwrap().root;
    for i in 6..100u64 {
        let witness = service.get_witness(&final_root, i).unwrap();
        assert_eq!(witness.compute_root(&leaf_hash(i)), final_root);
    }
}

#[test]
fn test_databases_are_isolated() {
    let storage = Storage::temporary().unwrap();
    let a = MerkleTreeService::open(&storage, "alpha").unwrap();
    let b = MerkleTreeService::open(&storage, "beta").unwrap();
    a.create(4).unwrap();
    b.create(4).unwrap();

    a.add_leaf_to_pool(1, leaf_hash(1)).unwrap();
    a.try_build(10).unwrap();

    assert_eq!(b.pending_count(), 0);
    assert_eq!(b.root_records().unwrap().len(), 1);
    assert_eq!(a.root_records().unwrap().len(), 2);
}

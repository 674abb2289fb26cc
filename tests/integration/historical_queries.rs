//! Root-addressed queries against earlier tree states

use super::test_utils::{leaf_hash, TestTree};
use merkle_sync::types::EMPTY_LEAF;
use merkle_sync::SyncError;

#[test]
fn test_every_committed_root_keeps_its_own_state() {
    let tree = TestTree::new(5);
    let service = &tree.service;
    let mut roots = Vec::new();

    for round in 0..4u64 {
        // Overwrite leaf 0 each round and add one new leaf.
        service.add_leaf_to_pool(0, leaf_hash(1_000 + round)).unwrap();
        service.add_leaf_to_pool(round + 1, leaf_hash(round + 1)).unwrap();
        roots.push(service.try_build(10).unwrap().root);
    }

    for (round, root) in roots.iter().enumerate() {
        let round = round as u64;
        assert_eq!(service.get_node(root, 0, 0).unwrap(), leaf_hash(1_000 + round));
        for later in (round + 2)..=4 {
            assert_eq!(service.get_node(root, 0, later).unwrap(), EMPTY_LEAF);
        }
        for index in 0..16u64 {
            let value = service.get_node(root, 0, index).unwrap();
            let witness = service.get_witness(root, index).unwrap();
            assert_eq!(witness.compute_root(&value), *root);
            assert_eq!(witness.leaf_index(), index);
        }
    }
}

#[test]
fn test_queries_on_unknown_root_fail() {
    let tree = TestTree::new(4);
    let bogus = [0x42u8; 32];
    assert!(matches!(
        tree.service.get_witness(&bogus, 0),
        Err(SyncError::RootNotFound(_))
    ));
    assert!(matches!(
        tree.service.get_node(&bogus, 1, 0),
        Err(SyncError::RootNotFound(_))
    ));
}

#[test]
fn test_level_and_index_bounds() {
    let tree = TestTree::new(4);
    let root = tree.service.latest_root().unwrap().unwrap().root;
    assert!(matches!(
        tree.service.get_node(&root, 4, 0),
        Err(SyncError::LevelOutOfRange { .. })
    ));
    assert!(matches!(
        tree.service.get_node(&root, 1, 4),
        Err(SyncError::IndexOutOfRange { .. })
    ));
    assert!(matches!(
        tree.service.get_witness(&root, 8),
        Err(SyncError::IndexOutOfRange { .. })
    ));
}

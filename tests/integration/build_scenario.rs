//! End-to-end build scenarios

use super::test_utils::{leaf_hash, TestTree};
use merkle_sync::tree::MerkleTreeEngine;
use merkle_sync::SyncError;

#[test]
fn test_height_four_scenario() {
    let tree = TestTree::new(4);
    let service = &tree.service;
    let empty_root = MerkleTreeEngine::new(4).unwrap().empty_root();
    assert_eq!(service.latest_root().unwrap().unwrap().root, empty_root);

    service.add_leaf_to_pool(3, leaf_hash(3)).unwrap();
    service.add_leaf_to_pool(5, leaf_hash(5)).unwrap();
    assert!(service.build(10));

    assert_eq!(service.pending_count(), 0);
    let records = service.root_records().unwrap();
    assert_eq!(records.len(), 2);
    let root = records[1].root;
    assert_ne!(root, empty_root);

    assert_eq!(service.get_node(&root, 0, 3).unwrap(), leaf_hash(3));
    assert_eq!(service.get_node(&root, 0, 5).unwrap(), leaf_hash(5));
    assert_eq!(service.get_node(&root, 3, 0).unwrap(), root);

    let witness = service.get_witness(&root, 3).unwrap();
    assert_eq!(witness.len(), 3);
    assert_eq!(witness.compute_root(&leaf_hash(3)), root);
}

#[test]
fn test_batched_and_single_builds_agree() {
    let batched = TestTree::new(6);
    let stepwise = TestTree::new(6);
    let indices = [0u64, 31, 7, 8, 16, 1];

    for &i in &indices {
        batched.service.add_leaf_to_pool(i, leaf_hash(i)).unwrap();
    }
    let batched_root = batched.service.try_build(100).unwrap().root;

    let mut stepwise_root = None;
    for &i in &indices {
        stepwise.service.add_leaf_to_pool(i, leaf_hash(i)).unwrap();
        stepwise_root = Some(stepwise.service.try_build(1).unwrap().root);
    }

    assert_eq!(Some(batched_root), stepwise_root);
    assert_eq!(stepwise.service.root_records().unwrap().len(), indices.len() + 1);
}

#[test]
fn test_second_create_is_rejected() {
    let tree = TestTree::new(4);
    let err = tree.service.create(4).unwrap_err();
    assert!(matches!(err, SyncError::AlreadyExists(ref db) if db == "testdb"));
    assert!(!err.is_retryable());
}

#[test]
fn test_last_write_wins_within_pool() {
    let tree = TestTree::new(4);
    tree.service.add_leaf_to_pool(2, leaf_hash(100)).unwrap();
    tree.service.add_leaf_to_pool(2, leaf_hash(200)).unwrap();
    assert_eq!(tree.service.pending_count(), 1);

    let report = tree.service.try_build(10).unwrap();
    assert_eq!(report.leaves_applied, 1);
    assert_eq!(
        tree.service.get_node(&report.root, 0, 2).unwrap(),
        leaf_hash(200)
    );
}

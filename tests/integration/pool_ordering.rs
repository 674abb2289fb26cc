//! Leaf pool fairness as seen through the service

use super::test_utils::{leaf_hash, TestTree};

#[test]
fn test_pending_leaves_oldest_first() {
    let tree = TestTree::new(5);
    for index in [9u64, 4, 12, 1] {
        tree.service.add_leaf_to_pool(index, leaf_hash(index)).unwrap();
    }
    // Resubmitting moves leaf 4 behind everything else.
    tree.service.add_leaf_to_pool(4, leaf_hash(44)).unwrap();

    let pending = tree.service.pending_leaves(10).unwrap();
    let order: Vec<u64> = pending.iter().map(|l| l.index).collect();
    assert_eq!(order, vec![9, 12, 1, 4]);
    assert!(pending.windows(2).all(|w| w[0].seq < w[1].seq));
}

#[test]
fn test_build_drains_in_submission_order() {
    let tree = TestTree::new(5);
    for index in [9u64, 4, 12, 1] {
        tree.service.add_leaf_to_pool(index, leaf_hash(index)).unwrap();
    }

    let first = tree.service.try_build(2).unwrap();
    assert_eq!(tree.service.get_node(&first.root, 0, 9).unwrap(), leaf_hash(9));
    assert_eq!(tree.service.get_node(&first.root, 0, 4).unwrap(), leaf_hash(4));
    let remaining: Vec<u64> = tree
        .service
        .pending_leaves(10)
        .unwrap()
        .iter()
        .map(|l| l.index)
        .collect();
    assert_eq!(remaining, vec![12, 1]);
}

//! Concurrent leaf index allocation

use super::test_utils::TestTree;
use merkle_sync::document::DocumentLeafWriter;
use std::collections::BTreeSet;
use std::sync::Arc;

#[test]
fn test_concurrent_allocations_are_distinct_and_contiguous() {
    let tree = TestTree::new(12);
    let service = Arc::new(tree.service);
    let start = service.peek_leaf_index().unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            std::thread::spawn(move || {
                (0..25)
                    .map(|_| service.next_leaf_index().unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let all: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    let unique: BTreeSet<u64> = all.iter().copied().collect();
    assert_eq!(unique.len(), all.len());
    assert_eq!(unique, (start..start + 200).collect::<BTreeSet<u64>>());
}

#[test]
fn test_documents_written_concurrently_all_land() {
    let tree = TestTree::new(8);
    let service = Arc::new(tree.service);

    let handles: Vec<_> = (0..4u8)
        .map(|t| {
            let service = Arc::clone(&service);
            std::thread::spawn(move || {
                let writer = DocumentLeafWriter::new(&service);
                (0..10u8)
                    .map(|i| writer.index_document(&[t, i]).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    let leaves: Vec<_> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    let report = service.try_build(100).unwrap();
    assert_eq!(report.leaves_applied, 40);
    for leaf in &leaves {
        assert_eq!(service.get_node(&report.root, 0, leaf.index).unwrap(), leaf.hash);
    }
}

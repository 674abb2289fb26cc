//! Property-based tests for determinism guarantees

use merkle_sync::store::{NodeStore, Storage};
use merkle_sync::tree::hasher::{self, hash_pair};
use merkle_sync::tree::MerkleTreeEngine;
use merkle_sync::types::{Hash, EMPTY_LEAF, MAX_HEIGHT};
use merkle_sync::MerkleTreeService;
use proptest::prelude::*;
use proptest::test_runner::{Config, TestRunner};
use std::collections::BTreeMap;

fn runner(cases: u32) -> TestRunner {
    TestRunner::new(Config {
        cases,
        ..Config::default()
    })
}

fn fresh_nodes() -> (Storage, NodeStore) {
    let storage = Storage::temporary().unwrap();
    let nodes = NodeStore::open(&storage, "prop").unwrap();
    (storage, nodes)
}

/// Leaf writes for a height-6 tree (capacity 32), duplicates allowed.
fn leaf_writes() -> impl Strategy<Value = Vec<(u64, [u8; 32])>> {
    prop::collection::vec((0u64..32, any::<[u8; 32]>()), 1..40)
}

/// Root over a dense leaf vector, computed level by level without storage.
fn naive_root(leaves: &[Hash]) -> Hash {
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| hash_pair(&pair[0], &pair[1]))
            .collect();
    }
    level[0]
}

/// Test that the default hash chain matches an empty tree for every height
#[test]
fn test_default_hashes_every_height() {
    let mut expected = EMPTY_LEAF;
    for height in 1..=MAX_HEIGHT {
        let engine = MerkleTreeEngine::new(height).unwrap();
        assert_eq!(engine.empty_root(), expected, "height {}", height);
        expected = hash_pair(&expected, &expected);
    }
    assert!(MerkleTreeEngine::new(0).is_err());
    assert!(MerkleTreeEngine::new(MAX_HEIGHT + 1).is_err());
}

/// Test that never-written nodes read as their level default at every height, level, and version
#[test]
fn test_unwritten_nodes_match_level_default() {
    let (_storage, nodes) = fresh_nodes();
    let engine = MerkleTreeEngine::new(4).unwrap();
    // Leaf 0 and its path are written; every other position stays default.
    engine.set_leaf(&nodes, 0, [9u8; 32], 1).unwrap();

    let strategy = (1u32..=MAX_HEIGHT)
        .prop_flat_map(|height| (Just(height), 0..height))
        .prop_flat_map(|(height, level)| (Just(height), Just(level), any::<u64>(), any::<u64>()));

    runner(256)
        .run(&strategy, |(height, level, raw_index, as_of)| {
            let engine = MerkleTreeEngine::new(height).unwrap();
            let width = 1u64 << (height - 1 - level);
            // Index 0 lies on the written path, so only positions 1.. are unwritten.
            prop_assume!(width > 1);
            let index = 1 + raw_index % (width - 1);

            let mut expected = EMPTY_LEAF;
            for _ in 0..level {
                expected = hash_pair(&expected, &expected);
            }
            prop_assert_eq!(engine.get_node(&nodes, level, index, as_of).unwrap(), expected);
            prop_assert_eq!(engine.default_hash(level), Some(expected));
            Ok(())
        })
        .unwrap();
}

/// Test that the root depends only on the final leaf values, not on write order or batching
#[test]
fn test_root_independent_of_order_and_batching() {
    runner(32)
        .run(&(leaf_writes(), any::<u64>()), |(writes, seed)| {
            let engine = MerkleTreeEngine::new(6).unwrap();

            // Last write per index wins.
            let mut dense = vec![EMPTY_LEAF; 32];
            let mut last: BTreeMap<u64, Hash> = BTreeMap::new();
            for (index, hash) in &writes {
                dense[*index as usize] = *hash;
                last.insert(*index, *hash);
            }
            let expected = naive_root(&dense);

            let (_batch_storage, batch_nodes) = fresh_nodes();
            let batched = engine.set_leaves(&batch_nodes, writes.iter().copied(), 0).unwrap();
            prop_assert_eq!(batched, expected);

            // Distinct indices applied one per version in a shuffled order.
            let mut shuffled: Vec<_> = last.into_iter().collect();
            let len = shuffled.len();
            for i in 0..len {
                let j = (seed.wrapping_mul(i as u64 + 1) % len as u64) as usize;
                shuffled.swap(i, j);
            }
            let (_step_storage, step_nodes) = fresh_nodes();
            let mut root = engine.empty_root();
            for (version, (index, hash)) in shuffled.into_iter().enumerate() {
                root = engine.set_leaf(&step_nodes, index, hash, version as u64).unwrap();
            }
            prop_assert_eq!(root, expected);
            Ok(())
        })
        .unwrap();
}

/// Test that every leaf's witness folds to the root and every historical version stays readable
#[test]
fn test_witness_consistency_across_versions() {
    runner(24)
        .run(&prop::collection::vec(leaf_writes(), 1..4), |batches| {
            let engine = MerkleTreeEngine::new(6).unwrap();
            let (_storage, nodes) = fresh_nodes();
            let mut dense = vec![EMPTY_LEAF; 32];
            let mut snapshots = Vec::new();

            for (version, batch) in batches.iter().enumerate() {
                for (index, hash) in batch {
                    dense[*index as usize] = *hash;
                }
                let root = engine
                    .set_leaves(&nodes, batch.iter().copied(), version as u64)
                    .unwrap();
                prop_assert_eq!(root, naive_root(&dense));
                snapshots.push((version as u64, root, dense.clone()));
            }

            for (version, root, leaves) in snapshots {
                prop_assert_eq!(engine.root(&nodes, version).unwrap(), root);
                for (index, leaf) in leaves.iter().enumerate() {
                    let index = index as u64;
                    prop_assert_eq!(engine.get_node(&nodes, 0, index, version).unwrap(), *leaf);
                    let witness = engine.witness(&nodes, index, version).unwrap();
                    prop_assert_eq!(witness.len(), 5);
                    prop_assert_eq!(witness.leaf_index(), index);
                    prop_assert_eq!(witness.compute_root(leaf), root);
                }
            }
            Ok(())
        })
        .unwrap();
}

/// Test that the pool hands out leaves in submission order with last-write-wins
#[test]
fn test_pool_order_follows_latest_submission() {
    runner(32)
        .run(&prop::collection::vec(0u64..16, 1..30), |indices| {
            let storage = Storage::temporary().unwrap();
            let service = MerkleTreeService::open(&storage, "prop").unwrap();
            service.create(5).unwrap();

            let mut expected: Vec<u64> = Vec::new();
            for (n, index) in indices.iter().enumerate() {
                service
                    .add_leaf_to_pool(*index, hasher::compute_content_hash(&(n as u64).to_be_bytes()))
                    .unwrap();
                expected.retain(|i| i != index);
                expected.push(*index);
            }

            let pending = service.pending_leaves(usize::MAX).unwrap();
            let order: Vec<u64> = pending.iter().map(|l| l.index).collect();
            prop_assert_eq!(order, expected);
            Ok(())
        })
        .unwrap();
}

/// Test that draining the pool in any batch size converges to the same root
#[test]
fn test_build_batch_size_does_not_change_final_root() {
    runner(16)
        .run(&(leaf_writes(), 1usize..8), |(writes, batch)| {
            let storage = Storage::temporary().unwrap();
            let all_at_once = MerkleTreeService::open(&storage, "one").unwrap();
            let in_batches = MerkleTreeService::open(&storage, "many").unwrap();
            all_at_once.create(6).unwrap();
            in_batches.create(6).unwrap();

            for (index, hash) in &writes {
                all_at_once.add_leaf_to_pool(*index, *hash).unwrap();
                in_batches.add_leaf_to_pool(*index, *hash).unwrap();
            }

            let expected = all_at_once.try_build(usize::MAX).unwrap().root;
            let mut root = None;
            while in_batches.pending_count() > 0 {
                root = Some(in_batches.try_build(batch).unwrap().root);
            }
            prop_assert_eq!(root, Some(expected));
            Ok(())
        })
        .unwrap();
}

//! Integration tests for the Merkle tree synchronization engine

mod build_scenario;
mod historical_queries;
mod persistence;
mod pool_ordering;
mod sequencer_uniqueness;
mod test_utils;

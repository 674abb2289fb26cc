//! Property-based tests for tree determinism and history guarantees

mod determinism;

//! Hash computation for tree nodes using BLAKE3

use crate::types::{Hash, EMPTY_LEAF};
use blake3::Hasher;

/// Compute the value of an inner node from its two children.
///
/// Hash = BLAKE3(left || right). Order matters: swapping children changes
/// the result, which is what lets a witness commit to a leaf's position.
pub fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(left);
    hasher.update(right);
    *hasher.finalize().as_bytes()
}

/// Compute content hash for document bytes
pub fn compute_content_hash(content: &[u8]) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(content);
    *hasher.finalize().as_bytes()
}

/// Default value of every level for a tree of `height` levels.
///
/// `defaults[0]` is the empty leaf and `defaults[l] = hash_pair(defaults[l-1], defaults[l-1])`,
/// so `defaults[height - 1]` is the root of a tree with no leaves written.
pub fn default_hashes(height: u32) -> Vec<Hash> {
    let mut defaults = Vec::with_capacity(height as usize);
    let mut current = EMPTY_LEAF;
    for _ in 0..height {
        defaults.push(current);
        current = hash_pair(&current, &current);
    }
    defaults
}

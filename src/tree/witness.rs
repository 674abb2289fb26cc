//! Authentication paths

use crate::tree::hasher::hash_pair;
use crate::types::{Hash, LeafIndex};
use serde::{Deserialize, Serialize};

/// One step of a witness: the sibling at this level and which side it is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessStep {
    pub sibling: Hash,
    /// True when the sibling is the left child, i.e. the path node is on the right.
    pub sibling_is_left: bool,
}

/// Sibling path from a leaf up to, but excluding, the root.
///
/// Steps are ordered leaf-to-root. Proof circuits fold them in exactly this
/// order, so neither the order nor the side flags may be rearranged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    pub path: Vec<WitnessStep>,
}

impl Witness {
    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Fold the path over `leaf` and return the implied root.
    pub fn compute_root(&self, leaf: &Hash) -> Hash {
        self.path.iter().fold(*leaf, |node, step| {
            if step.sibling_is_left {
                hash_pair(&step.sibling, &node)
            } else {
                hash_pair(&node, &step.sibling)
            }
        })
    }

    /// Leaf position implied by the side flags.
    pub fn leaf_index(&self) -> LeafIndex {
        self.path
            .iter()
            .enumerate()
            .filter(|(_, step)| step.sibling_is_left)
            .fold(0, |index, (level, _)| index | (1 << level))
    }
}

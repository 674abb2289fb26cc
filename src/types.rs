//! Core value types shared across the tree, pool, and ledger.

/// 32-byte BLAKE3 digest used for every node and leaf value.
pub type Hash = [u8; 32];

/// Position of a leaf at level 0.
pub type LeafIndex = u64;

/// Logical commit version. Version 0 is the creation record; each build
/// commits at the next version. This is the axis for all historical reads.
pub type Version = u64;

/// Hash of a leaf that was never written (or was cleared).
pub const EMPTY_LEAF: Hash = [0u8; 32];

/// Largest supported tree height. Leaf indices must fit in a `u64`.
pub const MAX_HEIGHT: u32 = 64;

/// Sequencer key used by document writes to allocate leaf positions.
pub const MERKLE_INDEX_KEY: &str = "merkle-index";

/// Address of a node: `level` 0 holds leaves, `height - 1` holds the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey {
    pub level: u32,
    pub index: u64,
}

impl NodeKey {
    pub fn new(level: u32, index: u64) -> Self {
        Self { level, index }
    }

    /// Storage key: one level byte followed by the big-endian index.
    pub fn encode(&self) -> [u8; 9] {
        let mut key = [0u8; 9];
        key[0] = self.level as u8;
        key[1..].copy_from_slice(&self.index.to_be_bytes());
        key
    }
}

/// Render a hash as lowercase hex.
pub fn hash_to_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Parse a 64-character hex string into a hash.
pub fn hash_from_hex(s: &str) -> Result<Hash, String> {
    let bytes = hex::decode(s.trim_start_matches("0x")).map_err(|e| e.to_string())?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| format!("expected 32 bytes, got {}", b.len()))
}

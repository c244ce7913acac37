//! Fixed-depth Merkle allowlist.
//!
//! Hashing is domain-separated SHA-256 so a leaf can never be replayed as an
//! interior node:
//!
//! - leaf: `SHA256(0x00 ‖ agent_id)`
//! - node: `SHA256(0x01 ‖ left ‖ right)`
//!
//! Unused leaf slots hold the zero element (32 zero bytes). A padded slot at
//! level `i > 0` holds the hash of two zero subtrees from level `i - 1`, so
//! only the populated prefix of each level is ever materialised.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::config::MAX_ALLOWLIST_DEPTH;
use crate::error::{PassportError, Result};

/// A 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

/// The padding value at level 0.
pub const ZERO_ELEMENT: Hash = [0u8; 32];

/// Hash an allowlist entry.
pub fn leaf_hash(agent_id: &str) -> Hash {
    let mut h = Sha256::new();
    h.update([LEAF_PREFIX]);
    h.update(agent_id.as_bytes());
    h.finalize().into()
}

/// Hash two children into their parent.
pub fn node_hash(left: &Hash, right: &Hash) -> Hash {
    let mut h = Sha256::new();
    h.update([NODE_PREFIX]);
    h.update(left);
    h.update(right);
    h.finalize().into()
}

/// Zero-subtree hash for every level, `zeros[0]` being the zero element.
pub(crate) fn zero_hashes(depth: usize) -> Vec<Hash> {
    let mut zeros = Vec::with_capacity(depth + 1);
    zeros.push(ZERO_ELEMENT);
    for i in 0..depth {
        let z = zeros[i];
        zeros.push(node_hash(&z, &z));
    }
    zeros
}

/// Ordered set of agent ids committed to by a single Merkle root.
#[derive(Debug, Clone)]
pub struct MerkleAllowlist {
    depth: usize,
    leaves: Vec<String>,
    positions: HashMap<String, usize>,
    /// `levels[0]` are the leaf hashes; `levels[depth]` is `[root]`.
    pub(crate) levels: Vec<Vec<Hash>>,
    pub(crate) zeros: Vec<Hash>,
}

impl MerkleAllowlist {
    /// Build the tree. Deterministic: the same leaves in the same order at
    /// the same depth always give the same root.
    pub fn build<I, S>(leaves: I, depth: usize) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if depth == 0 || depth > MAX_ALLOWLIST_DEPTH {
            return Err(PassportError::Validation(format!(
                "allowlist depth must be between 1 and {MAX_ALLOWLIST_DEPTH}, got {depth}"
            )));
        }
        let leaves: Vec<String> = leaves.into_iter().map(Into::into).collect();
        if leaves.is_empty() {
            return Err(PassportError::EmptyAllowlist);
        }
        let capacity = 1usize << depth;
        if leaves.len() > capacity {
            return Err(PassportError::AllowlistOverflow {
                len: leaves.len(),
                capacity,
            });
        }

        let mut positions = HashMap::with_capacity(leaves.len());
        for (i, id) in leaves.iter().enumerate() {
            if id.is_empty() {
                return Err(PassportError::Validation(format!(
                    "allowlist entry {i} is empty"
                )));
            }
            if positions.insert(id.clone(), i).is_some() {
                return Err(PassportError::Validation(format!(
                    "duplicate allowlist entry: {id}"
                )));
            }
        }

        let zeros = zero_hashes(depth);
        let mut levels: Vec<Vec<Hash>> = Vec::with_capacity(depth + 1);
        levels.push(leaves.iter().map(|id| leaf_hash(id)).collect());

        for level in 0..depth {
            let below = &levels[level];
            let mut above = Vec::with_capacity(below.len().div_ceil(2));
            for pair in below.chunks(2) {
                let right = pair.get(1).unwrap_or(&zeros[level]);
                above.push(node_hash(&pair[0], right));
            }
            levels.push(above);
        }

        Ok(Self {
            depth,
            leaves,
            positions,
            levels,
            zeros,
        })
    }

    pub fn root(&self) -> Hash {
        // levels[depth] always holds exactly one node: leaves is non-empty.
        self.levels[self.depth][0]
    }

    /// Root as lowercase hex, the form published in public signals.
    pub fn root_hex(&self) -> String {
        hex::encode(self.root())
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn capacity(&self) -> usize {
        1 << self.depth
    }

    pub fn leaves(&self) -> &[String] {
        &self.leaves
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Position of `agent_id` among the leaves, if present.
    pub fn index_of(&self, agent_id: &str) -> Option<usize> {
        self.positions.get(agent_id).copied()
    }

    pub fn contains(&self, agent_id: &str) -> bool {
        self.positions.contains_key(agent_id)
    }
}

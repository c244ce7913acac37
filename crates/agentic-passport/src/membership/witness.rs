//! Membership witnesses: the private input to a membership proof.

use serde::{Deserialize, Serialize};

use crate::error::{PassportError, Result};

use super::tree::{leaf_hash, node_hash, Hash, MerkleAllowlist};

/// Authentication path from one leaf to the root.
///
/// `path_indices[i]` is 0 when the running node is the left child at level
/// `i` and 1 when it is the right child. Path elements and the root are
/// lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipWitness {
    pub agent_id: String,
    pub leaf_index: usize,
    pub path_elements: Vec<String>,
    pub path_indices: Vec<u8>,
    pub merkle_root: String,
}

impl MembershipWitness {
    /// Fold the path back up to a root, returned as hex.
    pub fn compute_root(&self) -> Result<String> {
        if self.path_elements.len() != self.path_indices.len() {
            return Err(PassportError::Validation(
                "pathElements and pathIndices differ in length".into(),
            ));
        }
        let mut node = leaf_hash(&self.agent_id);
        for (sibling, bit) in self.path_elements.iter().zip(&self.path_indices) {
            let sibling = decode_hash(sibling)?;
            node = match bit {
                0 => node_hash(&node, &sibling),
                1 => node_hash(&sibling, &node),
                other => {
                    return Err(PassportError::Validation(format!(
                        "path index must be 0 or 1, got {other}"
                    )))
                }
            };
        }
        Ok(hex::encode(node))
    }

    /// Whether the path actually leads to the claimed root.
    pub fn is_consistent(&self) -> bool {
        self.compute_root()
            .map(|root| root.eq_ignore_ascii_case(&self.merkle_root))
            .unwrap_or(false)
    }
}

fn decode_hash(s: &str) -> Result<Hash> {
    let bytes = hex::decode(s)
        .map_err(|e| PassportError::Validation(format!("bad path element: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| PassportError::Validation("path element must be 32 bytes".into()))
}

impl MerkleAllowlist {
    /// Build the witness for `agent_id`.
    ///
    /// Returns [`PassportError::NotInAllowlist`] when the id is absent.
    pub fn witness(&self, agent_id: &str) -> Result<MembershipWitness> {
        let leaf_index = self
            .index_of(agent_id)
            .ok_or(PassportError::NotInAllowlist)?;

        let mut path_elements = Vec::with_capacity(self.depth());
        let mut path_indices = Vec::with_capacity(self.depth());
        let mut idx = leaf_index;
        for level in 0..self.depth() {
            let sibling = self.levels[level]
                .get(idx ^ 1)
                .unwrap_or(&self.zeros[level]);
            path_elements.push(hex::encode(sibling));
            path_indices.push((idx & 1) as u8);
            idx >>= 1;
        }

        Ok(MembershipWitness {
            agent_id: agent_id.to_string(),
            leaf_index,
            path_elements,
            path_indices,
            merkle_root: self.root_hex(),
        })
    }
}

//! Proving backend seam.
//!
//! The arithmetic circuit and the proving math live outside this crate.
//! Anything that can turn a [`MembershipWitness`] into a proof and check one
//! later implements [`ProvingBackend`]; mock and real backends are
//! interchangeable behind it.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;

use super::witness::MembershipWitness;

/// Identifies the circuit and where its proving material lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitArtifacts {
    pub circuit_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wasm_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zkey_path: Option<PathBuf>,
}

impl CircuitArtifacts {
    pub fn new(circuit_id: impl Into<String>) -> Self {
        Self {
            circuit_id: circuit_id.into(),
            wasm_path: None,
            zkey_path: None,
        }
    }
}

/// Public verification key for one circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationKey {
    pub circuit_id: String,
    /// Backend-specific key material, passed through untouched.
    pub key: serde_json::Value,
}

/// Opaque proof produced by a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MembershipProof(pub serde_json::Value);

/// Public outputs of a membership proof. The first element is the Merkle
/// root the proof commits to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicSignals(pub Vec<String>);

impl PublicSignals {
    pub fn merkle_root(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Whether the first signal names the 32-byte root given as hex.
    ///
    /// Circuit provers emit field elements in decimal while the allowlist
    /// renders its root in hex, so the signal may be either: hex (any case,
    /// optional `0x`) or the decimal value of the big-endian root.
    pub fn commits_to(&self, root_hex: &str) -> bool {
        let (Some(signal), Ok(root)) = (self.merkle_root(), hex::decode(root_hex)) else {
            return false;
        };
        let signal = signal.trim();
        let hex_form = signal.strip_prefix("0x").unwrap_or(signal);
        if hex::decode(hex_form).is_ok_and(|bytes| bytes == root) {
            return true;
        }
        decimal_to_be_bytes(signal, root.len()).is_some_and(|bytes| bytes == root)
    }
}

/// Hex SHA-256 over the proof and its public signals, used to reference a
/// proof on the ledger without storing it.
pub fn proof_hash(proof: &MembershipProof, signals: &PublicSignals) -> Result<String> {
    let bytes = serde_json::to_vec(&serde_json::json!({
        "proof": proof,
        "publicSignals": signals,
    }))?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Parse an unsigned decimal into exactly `width` big-endian bytes.
/// `None` for anything that is not all digits or does not fit.
fn decimal_to_be_bytes(digits: &str, width: usize) -> Option<Vec<u8>> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut out = vec![0u8; width];
    for d in digits.bytes() {
        let mut carry = u32::from(d - b'0');
        for byte in out.iter_mut().rev() {
            let v = u32::from(*byte) * 10 + carry;
            *byte = (v & 0xff) as u8;
            carry = v >> 8;
        }
        if carry != 0 {
            return None;
        }
    }
    Some(out)
}

/// A proof system able to attest allowlist membership.
#[async_trait]
pub trait ProvingBackend: Send + Sync {
    /// Produce a proof that the witness's agent is a member of the tree
    /// committed to by `witness.merkle_root`.
    async fn prove(
        &self,
        witness: &MembershipWitness,
        artifacts: &CircuitArtifacts,
    ) -> Result<(MembershipProof, PublicSignals)>;

    /// Check a proof. `Ok(false)` means the proof is well-formed enough to
    /// check and does not verify.
    async fn verify(
        &self,
        proof: &MembershipProof,
        signals: &PublicSignals,
        vk: &VerificationKey,
    ) -> Result<bool>;
}

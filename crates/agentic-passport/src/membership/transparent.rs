//! Transparent development backend.
//!
//! Deterministic and keyed, with no zero-knowledge property: the "proof" is
//! an HMAC over the circuit id and the committed root, and anyone holding
//! the key can mint one. It does check the membership relation before
//! committing, so it exercises the same success and failure paths as a
//! real prover. Use a [`super::RemoteProver`] for anything beyond
//! development and tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::crypto::mac::{self, MacKey};
use crate::crypto::constant_time_eq;
use crate::error::{PassportError, Result};

use super::backend::{
    CircuitArtifacts, MembershipProof, ProvingBackend, PublicSignals, VerificationKey,
};
use super::witness::MembershipWitness;

pub const TRANSPARENT_SCHEME: &str = "transparent-hmac-sha256";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransparentProof {
    scheme: String,
    circuit_id: String,
    commitment: String,
}

/// Keyed, deterministic stand-in for a zk-SNARK prover.
#[derive(Debug, Clone)]
pub struct TransparentBackend {
    key: MacKey,
}

impl TransparentBackend {
    pub fn new(key: MacKey) -> Self {
        Self { key }
    }

    /// Verification key matching what this backend produces for `circuit_id`.
    pub fn verification_key(&self, circuit_id: impl Into<String>) -> VerificationKey {
        VerificationKey {
            circuit_id: circuit_id.into(),
            key: serde_json::json!({ "scheme": TRANSPARENT_SCHEME }),
        }
    }

    fn commit(&self, circuit_id: &str, root: &str) -> String {
        mac::mac_hex(&self.key, &[circuit_id.as_bytes(), b"|", root.as_bytes()])
    }
}

#[async_trait]
impl ProvingBackend for TransparentBackend {
    async fn prove(
        &self,
        witness: &MembershipWitness,
        artifacts: &CircuitArtifacts,
    ) -> Result<(MembershipProof, PublicSignals)> {
        let computed = witness
            .compute_root()
            .map_err(|e| PassportError::Prover(e.to_string()))?;
        if !computed.eq_ignore_ascii_case(&witness.merkle_root) {
            return Err(PassportError::Prover(
                "witness does not satisfy the membership relation".into(),
            ));
        }

        let root = computed;
        let proof = TransparentProof {
            scheme: TRANSPARENT_SCHEME.to_string(),
            circuit_id: artifacts.circuit_id.clone(),
            commitment: self.commit(&artifacts.circuit_id, &root),
        };
        Ok((
            MembershipProof(serde_json::to_value(proof)?),
            PublicSignals(vec![root]),
        ))
    }

    async fn verify(
        &self,
        proof: &MembershipProof,
        signals: &PublicSignals,
        vk: &VerificationKey,
    ) -> Result<bool> {
        let Ok(proof) = serde_json::from_value::<TransparentProof>(proof.0.clone()) else {
            return Ok(false);
        };
        let Some(root) = signals.merkle_root() else {
            return Ok(false);
        };
        if proof.scheme != TRANSPARENT_SCHEME || proof.circuit_id != vk.circuit_id {
            return Ok(false);
        }
        let expected = self.commit(&vk.circuit_id, &root.to_ascii_lowercase());
        Ok(constant_time_eq(
            expected.as_bytes(),
            proof.commitment.as_bytes(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::MerkleAllowlist;

    fn backend() -> TransparentBackend {
        TransparentBackend::new(MacKey::new(b"prover-key".to_vec()).unwrap())
    }

    fn tree() -> MerkleAllowlist {
        MerkleAllowlist::build(["100", "101", "111"].map(String::from), 3).unwrap()
    }

    #[tokio::test]
    async fn test_prove_verify() {
        let b = backend();
        let t = tree();
        let artifacts = CircuitArtifacts::new("membership-v1");
        let (proof, signals) = b.prove(&t.witness("101").unwrap(), &artifacts).await.unwrap();
        assert_eq!(signals.merkle_root(), Some(t.root_hex().as_str()));
        assert!(b
            .verify(&proof, &signals, &b.verification_key("membership-v1"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_deterministic() {
        let b = backend();
        let t = tree();
        let a = CircuitArtifacts::new("c");
        let (p1, _) = b.prove(&t.witness("100").unwrap(), &a).await.unwrap();
        let (p2, _) = b.prove(&t.witness("100").unwrap(), &a).await.unwrap();
        assert_eq!(p1, p2);
    }

    #[tokio::test]
    async fn test_unsatisfied_witness_rejected() {
        let b = backend();
        let mut w = tree().witness("100").unwrap();
        w.agent_id = "999".into();
        let err = b.prove(&w, &CircuitArtifacts::new("c")).await.unwrap_err();
        assert!(matches!(err, PassportError::Prover(_)));
    }

    #[tokio::test]
    async fn test_verify_rejects_tampering() {
        let b = backend();
        let t = tree();
        let (proof, signals) = b
            .prove(&t.witness("111").unwrap(), &CircuitArtifacts::new("c"))
            .await
            .unwrap();
        let vk = b.verification_key("c");

        let other_root = PublicSignals(vec!["00".repeat(32)]);
        assert!(!b.verify(&proof, &other_root, &vk).await.unwrap());
        assert!(!b.verify(&proof, &PublicSignals(vec![]), &vk).await.unwrap());
        assert!(!b
            .verify(&proof, &signals, &b.verification_key("other"))
            .await
            .unwrap());
        assert!(!b
            .verify(&MembershipProof(serde_json::json!("junk")), &signals, &vk)
            .await
            .unwrap());

        let stranger = TransparentBackend::new(MacKey::new(b"someone-else".to_vec()).unwrap());
        assert!(!stranger.verify(&proof, &signals, &vk).await.unwrap());
    }
}

//! Membership proof orchestration.

use std::sync::Arc;

use crate::audit::{AuditEntry, TxId};
use crate::config::PassportConfig;
use crate::error::{PassportError, Result};
use crate::ledger::AuditLedger;
use crate::passport::AgentId;
use crate::time;

use super::backend::{
    proof_hash, CircuitArtifacts, MembershipProof, ProvingBackend, PublicSignals,
    VerificationKey,
};
use super::tree::MerkleAllowlist;

/// Builds allowlists, requests proofs and checks them.
///
/// Allowlist members never leave this service except inside the witness
/// handed to the backend; log records carry only the leaf count and root.
/// Attestations carry only the agent id the caller presents with a proof.
pub struct MembershipProofService {
    config: Arc<PassportConfig>,
    backend: Arc<dyn ProvingBackend>,
    artifacts: CircuitArtifacts,
}

impl MembershipProofService {
    pub fn new(
        config: Arc<PassportConfig>,
        backend: Arc<dyn ProvingBackend>,
        artifacts: CircuitArtifacts,
    ) -> Self {
        Self {
            config,
            backend,
            artifacts,
        }
    }

    pub fn artifacts(&self) -> &CircuitArtifacts {
        &self.artifacts
    }

    /// Build an allowlist at the configured depth.
    pub fn build_allowlist<I, S>(&self, leaves: I) -> Result<MerkleAllowlist>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tree = MerkleAllowlist::build(leaves, self.config.allowlist_depth)?;
        log::debug!(
            "built allowlist: {} leaves, depth {}, root {}",
            tree.len(),
            tree.depth(),
            tree.root_hex()
        );
        Ok(tree)
    }

    /// Prove that `agent_id` is in `tree`.
    ///
    /// Membership is checked locally first; a non-member never reaches the
    /// backend and gets [`PassportError::NotInAllowlist`]. The backend's
    /// public signals must commit to `tree`'s root.
    pub async fn prove(
        &self,
        tree: &MerkleAllowlist,
        agent_id: &str,
    ) -> Result<(MembershipProof, PublicSignals)> {
        let witness = tree.witness(agent_id)?;
        log::info!(
            "membership proof requested over {} leaves (root {})",
            tree.len(),
            witness.merkle_root
        );

        let (proof, signals) = time::bounded(
            self.config.prover_timeout,
            "proving backend",
            self.backend.prove(&witness, &self.artifacts),
        )
        .await?;

        if signals.commits_to(&witness.merkle_root) {
            Ok((proof, signals))
        } else {
            Err(PassportError::Prover(
                "public signals do not commit to the allowlist root".into(),
            ))
        }
    }

    /// Verify a proof. Fails closed: malformed signals, backend errors and
    /// timeouts all yield `false`.
    pub async fn verify(
        &self,
        proof: &MembershipProof,
        signals: &PublicSignals,
        vk: &VerificationKey,
    ) -> bool {
        if signals.0.is_empty() || signals.0.iter().any(|s| s.trim().is_empty()) {
            return false;
        }
        match time::bounded(
            self.config.prover_timeout,
            "proof verification",
            self.backend.verify(proof, signals, vk),
        )
        .await
        {
            Ok(valid) => valid,
            Err(e) => {
                log::warn!("proof verification failed closed: {e}");
                false
            }
        }
    }

    /// Like [`verify`](Self::verify), additionally requiring the signals to
    /// carry `expected_root`.
    pub async fn verify_against_root(
        &self,
        proof: &MembershipProof,
        signals: &PublicSignals,
        vk: &VerificationKey,
        expected_root: &str,
    ) -> bool {
        signals.commits_to(expected_root) && self.verify(proof, signals, vk).await
    }

    /// Append a proof attestation for `agent_id` to `ledger`.
    ///
    /// The entry carries the hash of the proof and its signals plus the
    /// outcome; the proof itself is not stored.
    pub async fn attest(
        &self,
        ledger: &dyn AuditLedger,
        agent_id: &AgentId,
        proof: &MembershipProof,
        signals: &PublicSignals,
        verified: bool,
    ) -> Result<TxId> {
        let entry =
            AuditEntry::proof_attestation(agent_id.clone(), proof_hash(proof, signals)?, verified);
        let tx = time::bounded(
            self.config.ledger_timeout,
            "ledger append",
            ledger.log_action(&entry),
        )
        .await?;
        log::info!("attested membership proof for {agent_id}: verified={verified} ({tx})");
        Ok(tx)
    }

    /// Verify a proof, optionally against `expected_root`, and record the
    /// outcome on `ledger`. A rejected proof is still recorded.
    pub async fn verify_and_attest(
        &self,
        ledger: &dyn AuditLedger,
        agent_id: &AgentId,
        proof: &MembershipProof,
        signals: &PublicSignals,
        vk: &VerificationKey,
        expected_root: Option<&str>,
    ) -> Result<(bool, TxId)> {
        let valid = match expected_root {
            Some(root) => self.verify_against_root(proof, signals, vk, root).await,
            None => self.verify(proof, signals, vk).await,
        };
        let tx = self.attest(ledger, agent_id, proof, signals, valid).await?;
        Ok((valid, tx))
    }

    /// [`verify`](Self::verify) as a `Result`.
    pub async fn require_valid(
        &self,
        proof: &MembershipProof,
        signals: &PublicSignals,
        vk: &VerificationKey,
    ) -> Result<()> {
        if self.verify(proof, signals, vk).await {
            Ok(())
        } else {
            Err(PassportError::ProofVerificationFailed)
        }
    }
}

//! Allowlist membership proofs.
//!
//! Proving requires the server to have been started with an allowlist.
//! Verification works without one; with one, proofs must also commit to
//! the server's own root. A verify request naming an `agentId` is also
//! attested on the ledger, valid or not.

use agentic_passport::{AgentId, MembershipProof, PublicSignals, TxId};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProveRequest {
    pub agent_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofBundle {
    pub proof: MembershipProof,
    pub public_signals: PublicSignals,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[serde(flatten)]
    pub bundle: ProofBundle,
    /// Agent presenting the proof. When set, the outcome is recorded.
    #[serde(default)]
    pub agent_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<TxId>,
}

/// `POST /membership/prove`
pub async fn prove(
    State(state): State<AppState>,
    body: Result<Json<ProveRequest>, JsonRejection>,
) -> Result<Json<ProofBundle>, ApiError> {
    let Json(req) = body?;
    let tree = state.allowlist.as_ref().ok_or_else(|| ApiError::Unavailable {
        error: "membership proofs disabled".into(),
        details: "server was started without an allowlist".into(),
    })?;
    let (proof, public_signals) = state.membership.prove(tree, &req.agent_id).await?;
    Ok(Json(ProofBundle {
        proof,
        public_signals,
    }))
}

/// `POST /membership/verify`
pub async fn verify(
    State(state): State<AppState>,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let Json(VerifyRequest { bundle, agent_id }) = body?;
    let vk = &state.verification_key;
    let root = state.allowlist.as_ref().map(|tree| tree.root_hex());

    let Some(agent_id) = agent_id else {
        let valid = match &root {
            Some(root) => {
                state
                    .membership
                    .verify_against_root(&bundle.proof, &bundle.public_signals, vk, root)
                    .await
            }
            None => {
                state
                    .membership
                    .verify(&bundle.proof, &bundle.public_signals, vk)
                    .await
            }
        };
        return Ok(Json(VerifyResponse { valid, tx_id: None }));
    };

    if agent_id.trim().is_empty() {
        return Err(ApiError::Validation("agentId must not be empty".into()));
    }
    let (valid, tx_id) = state
        .membership
        .verify_and_attest(
            state.ledger.as_ref(),
            &AgentId::new(agent_id),
            &bundle.proof,
            &bundle.public_signals,
            vk,
            root.as_deref(),
        )
        .await?;
    tracing::info!(valid, tx_id = %tx_id, "membership proof attested");
    Ok(Json(VerifyResponse {
        valid,
        tx_id: Some(tx_id),
    }))
}

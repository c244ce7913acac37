//! HTTP client for an external proving service.
//!
//! Contract:
//!
//! - `POST {endpoint}/prove` with `{agentId, pathElements, pathIndices,
//!   merkleRoot, circuitId}` answers `{proof, publicSignals}`.
//! - `POST {endpoint}/verify` with `{proof, publicSignals, verificationKey}`
//!   answers either a bare boolean or `{valid: bool}`.
//!
//! Retries are not built in. Deadlines are applied by the caller.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{PassportError, Result};

use super::backend::{
    CircuitArtifacts, MembershipProof, ProvingBackend, PublicSignals, VerificationKey,
};
use super::witness::MembershipWitness;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProveResponse {
    proof: Value,
    public_signals: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VerifyResponse {
    Bare(bool),
    Wrapped { valid: bool },
}

/// Proving backend reached over HTTP.
#[derive(Debug, Clone)]
pub struct RemoteProver {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl RemoteProver {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| PassportError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: None,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let url = format!("{}/{path}", self.endpoint);
        let mut req = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| PassportError::Prover(format!("{path}: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(PassportError::Prover(format!(
                "{path}: HTTP {status}: {}",
                truncate(&text, 200)
            )));
        }
        resp.json::<Value>()
            .await
            .map_err(|e| PassportError::Prover(format!("{path}: invalid response body: {e}")))
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

pub(crate) fn prove_request(witness: &MembershipWitness, artifacts: &CircuitArtifacts) -> Value {
    json!({
        "agentId": witness.agent_id,
        "pathElements": witness.path_elements,
        "pathIndices": witness.path_indices,
        "merkleRoot": witness.merkle_root,
        "circuitId": artifacts.circuit_id,
    })
}

pub(crate) fn parse_prove_response(body: Value) -> Result<(MembershipProof, PublicSignals)> {
    let resp: ProveResponse = serde_json::from_value(body)
        .map_err(|e| PassportError::Prover(format!("malformed prove response: {e}")))?;
    // Provers commonly emit field elements as decimal strings, sometimes as
    // bare numbers.
    let signals = resp
        .public_signals
        .into_iter()
        .map(|v| match v {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(PassportError::Prover(format!(
                "unexpected public signal: {other}"
            ))),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((MembershipProof(resp.proof), PublicSignals(signals)))
}

pub(crate) fn parse_verify_response(body: Value) -> Result<bool> {
    match serde_json::from_value::<VerifyResponse>(body) {
        Ok(VerifyResponse::Bare(v)) | Ok(VerifyResponse::Wrapped { valid: v }) => Ok(v),
        Err(e) => Err(PassportError::Prover(format!(
            "malformed verify response: {e}"
        ))),
    }
}

#[async_trait]
impl ProvingBackend for RemoteProver {
    async fn prove(
        &self,
        witness: &MembershipWitness,
        artifacts: &CircuitArtifacts,
    ) -> Result<(MembershipProof, PublicSignals)> {
        let body = self.post("prove", &prove_request(witness, artifacts)).await?;
        parse_prove_response(body)
    }

    async fn verify(
        &self,
        proof: &MembershipProof,
        signals: &PublicSignals,
        vk: &VerificationKey,
    ) -> Result<bool> {
        let body = json!({
            "proof": proof,
            "publicSignals": signals,
            "verificationKey": vk,
        });
        parse_verify_response(self.post("verify", &body).await?)
    }
}

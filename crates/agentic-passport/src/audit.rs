//! Audit records: the append-only trail of authorized actions.

use serde::{Deserialize, Serialize};

use crate::crypto::random;
use crate::passport::AgentId;

/// Unique identifier for an audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogId(pub String);

impl LogId {
    /// Generate a fresh log identifier.
    pub fn generate() -> Self {
        Self(random::new_log_id())
    }
}

impl std::fmt::Display for LogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ledger transaction identifier returned by an append.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(pub String);

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an agent intends to do: a verb applied to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub action: String,
    pub target: String,
}

impl Intent {
    pub fn new(action: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            target: target.into(),
        }
    }
}

/// Action name on proof attestation entries.
pub const PROOF_ATTESTATION_ACTION: &str = "MEMBERSHIP_PROOF";

/// Outcome recorded in an audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision")]
pub enum AuditResult {
    Allowed,
    Denied { reason: String },
    /// A record that is not an authorization decision, such as a proof
    /// attestation or a governance event. Never moves passport counters and
    /// does not require the agent to be registered.
    Recorded { outcome: String },
}

impl AuditResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// A single immutable ledger record of an authorization outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub log_id: LogId,
    pub agent_id: AgentId,
    pub action: String,
    pub target: String,
    pub result: AuditResult,
    pub timestamp: String,
    pub passport_valid: bool,
}

impl AuditEntry {
    /// Build an `Allowed` entry for an authorized intent.
    pub fn allowed(agent_id: AgentId, intent: &Intent) -> Self {
        Self {
            log_id: LogId::generate(),
            agent_id,
            action: intent.action.clone(),
            target: intent.target.clone(),
            result: AuditResult::Allowed,
            timestamp: crate::time::now_rfc3339(),
            passport_valid: true,
        }
    }

    /// Record the outcome of a membership proof check. The target is the
    /// proof hash, so the proof itself stays off the ledger.
    pub fn proof_attestation(
        agent_id: AgentId,
        proof_hash: impl Into<String>,
        verified: bool,
    ) -> Self {
        let outcome = if verified { "verified" } else { "rejected" };
        Self::recorded(agent_id, PROOF_ATTESTATION_ACTION, proof_hash, outcome)
    }

    /// An informational entry. `passport_valid` is false: no passport was
    /// authenticated to produce it.
    pub fn recorded(
        agent_id: AgentId,
        action: impl Into<String>,
        target: impl Into<String>,
        outcome: impl Into<String>,
    ) -> Self {
        Self {
            log_id: LogId::generate(),
            agent_id,
            action: action.into(),
            target: target.into(),
            result: AuditResult::Recorded {
                outcome: outcome.into(),
            },
            timestamp: crate::time::now_rfc3339(),
            passport_valid: false,
        }
    }
}

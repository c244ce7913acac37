//! Action authorization: identity check, policy check, audit append.
//!
//! Each call walks a fixed sequence of stages:
//!
//! ```text
//! Received → IdentityChecked → PolicyChecked → Logged → Responded
//!     └──────────┴─────────────────┴──→ Denied
//! ```
//!
//! The official passport is fetched from the ledger on every call and never
//! cached, so a revocation or role change takes effect on the next request.
//! A call makes at most two ledger round trips, strictly in sequence: one
//! read of the passport and one append.

use std::sync::Arc;

use serde::Serialize;

use crate::audit::{AuditEntry, Intent, TxId};
use crate::config::PassportConfig;
use crate::crypto::constant_time_eq;
use crate::error::{PassportError, Result};
use crate::ledger::AuditLedger;
use crate::passport::{Passport, PassportStatus, Role};
use crate::policy::PolicyEngine;
use crate::time;

/// How far a request got through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuthorizationStage {
    Received,
    IdentityChecked,
    PolicyChecked,
    Logged,
    Responded,
    Denied,
}

/// Why a request was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    /// No passport with the submitted agent id exists on the ledger.
    UnknownAgent,
    /// Submitted signature differs from the ledger copy.
    IdentityMismatch,
    /// The ledger copy is revoked.
    PassportRevoked,
    /// The official role may not perform the requested action.
    PolicyViolation { role: Role, action: String },
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownAgent => write!(f, "unknown agent"),
            // Carries no policy detail.
            Self::IdentityMismatch => write!(f, "identity verification failed"),
            Self::PassportRevoked => write!(f, "passport revoked"),
            Self::PolicyViolation { role, action } => {
                write!(f, "policy violation: role {role} may not perform {action}")
            }
        }
    }
}

/// A refused request and the stage it last completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub reason: DenialReason,
    /// Last stage successfully passed before the denial.
    pub stage: AuthorizationStage,
}

impl Denial {
    fn new(reason: DenialReason, stage: AuthorizationStage) -> Self {
        Self { reason, stage }
    }
}

/// Outcome of [`ActionAuthorizer::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Allowed { tx_id: TxId, entry: AuditEntry },
    Denied(Denial),
}

impl Authorization {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Stage the request ended in.
    pub fn stage(&self) -> AuthorizationStage {
        match self {
            Self::Allowed { .. } => AuthorizationStage::Responded,
            Self::Denied(_) => AuthorizationStage::Denied,
        }
    }

    pub fn tx_id(&self) -> Option<&TxId> {
        match self {
            Self::Allowed { tx_id, .. } => Some(tx_id),
            Self::Denied(_) => None,
        }
    }

    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Self::Allowed { .. } => None,
            Self::Denied(d) => Some(d),
        }
    }
}

/// Gatekeeper in front of every agent action.
pub struct ActionAuthorizer {
    config: Arc<PassportConfig>,
    ledger: Arc<dyn AuditLedger>,
    policy: PolicyEngine,
}

impl ActionAuthorizer {
    pub fn new(config: Arc<PassportConfig>, ledger: Arc<dyn AuditLedger>) -> Self {
        Self {
            config,
            ledger,
            policy: PolicyEngine::new(),
        }
    }

    /// Authorize `intent` for the agent presenting `submitted`.
    ///
    /// Returns `Ok(Authorization::Denied(..))` for every refusal; `Err` is
    /// reserved for malformed input and ledger failures. An append that fails
    /// after the policy allowed the action is
    /// [`PassportError::ExecutionFailed`] and is not retried.
    pub async fn execute(&self, submitted: &Passport, intent: &Intent) -> Result<Authorization> {
        if intent.action.trim().is_empty() {
            return Err(PassportError::Validation("intent.action must not be empty".into()));
        }
        if intent.target.trim().is_empty() {
            return Err(PassportError::Validation("intent.target must not be empty".into()));
        }
        let agent_id = &submitted.agent_id;

        // Received → fetch the authoritative copy.
        let official = match time::bounded(
            self.config.ledger_timeout,
            "ledger get_passport",
            self.ledger.get_passport(agent_id),
        )
        .await
        {
            Ok(p) => p,
            Err(PassportError::NotFound(_)) => {
                return Ok(self.deny(
                    submitted,
                    DenialReason::UnknownAgent,
                    AuthorizationStage::Received,
                ));
            }
            Err(e) => return Err(e),
        };

        if !constant_time_eq(submitted.signature.as_bytes(), official.signature.as_bytes()) {
            return Ok(self.deny(
                submitted,
                DenialReason::IdentityMismatch,
                AuthorizationStage::Received,
            ));
        }
        if official.status == PassportStatus::Revoked {
            return Ok(self.deny(
                submitted,
                DenialReason::PassportRevoked,
                AuthorizationStage::IdentityChecked,
            ));
        }

        // IdentityChecked → policy, always on the ledger's role.
        if !self.policy.decision(&official.role, &intent.action).is_allow() {
            return Ok(self.deny(
                submitted,
                DenialReason::PolicyViolation {
                    role: official.role.clone(),
                    action: intent.action.clone(),
                },
                AuthorizationStage::IdentityChecked,
            ));
        }

        // PolicyChecked → append.
        let entry = AuditEntry::allowed(official.agent_id.clone(), intent);
        let tx_id = time::bounded(
            self.config.ledger_timeout,
            "ledger log_action",
            self.ledger.log_action(&entry),
        )
        .await
        .map_err(|e| PassportError::ExecutionFailed(e.to_string()))?;

        log::info!(
            "authorized {} {} on {} (log {}, tx {tx_id})",
            official.agent_id,
            entry.action,
            entry.target,
            entry.log_id
        );
        Ok(Authorization::Allowed { tx_id, entry })
    }

    fn deny(
        &self,
        submitted: &Passport,
        reason: DenialReason,
        stage: AuthorizationStage,
    ) -> Authorization {
        log::info!("denied {} after {stage:?}: {reason}", submitted.agent_id);
        Authorization::Denied(Denial::new(reason, stage))
    }
}

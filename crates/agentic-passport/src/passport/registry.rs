//! Passport issuance and signature verification.

use std::sync::Arc;

use crate::config::PassportConfig;
use crate::crypto::mac::{self, MAC_LEN};
use crate::crypto::random;
use crate::error::{PassportError, Result};
use crate::ledger::AuditLedger;
use crate::time;

use super::types::{AgentId, Passport, PassportStatus, Role};

/// Issues passports and checks their signatures.
///
/// The registry holds no passport state of its own; the ledger is the
/// single source of truth.
pub struct PassportRegistry {
    config: Arc<PassportConfig>,
    ledger: Arc<dyn AuditLedger>,
}

impl PassportRegistry {
    pub fn new(config: Arc<PassportConfig>, ledger: Arc<dyn AuditLedger>) -> Self {
        Self { config, ledger }
    }

    /// Compute the signature for an `agentId ‖ issuedAt` pair.
    pub fn sign(&self, agent_id: &AgentId, issued_at: &str) -> String {
        mac::mac_hex(
            &self.config.secret_key,
            &[agent_id.as_str().as_bytes(), issued_at.as_bytes()],
        )
    }

    /// Issue a new passport and register it on the ledger.
    ///
    /// The ledger write is attempted exactly once. Any failure, including a
    /// timeout, surfaces as [`PassportError::IssuanceFailed`].
    pub async fn issue_passport(
        &self,
        role: Role,
        purpose: &str,
        mission_scope: &str,
    ) -> Result<Passport> {
        self.issue(AgentId(random::new_agent_id()), role, purpose, mission_scope)
            .await
    }

    /// Issue a passport under an id the caller chose, for agents that
    /// carry a configured identity. The id must be 1 to 128 characters of
    /// `[A-Za-z0-9_-]`; a taken id fails like any other ledger rejection.
    pub async fn issue_passport_with_id(
        &self,
        agent_id: AgentId,
        role: Role,
        purpose: &str,
        mission_scope: &str,
    ) -> Result<Passport> {
        let id = agent_id.as_str();
        let usable = !id.is_empty()
            && id.len() <= 128
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !usable {
            return Err(PassportError::Validation(format!(
                "agentId must be 1-128 characters of [A-Za-z0-9_-]: {id:?}"
            )));
        }
        self.issue(agent_id, role, purpose, mission_scope).await
    }

    async fn issue(
        &self,
        agent_id: AgentId,
        role: Role,
        purpose: &str,
        mission_scope: &str,
    ) -> Result<Passport> {
        let purpose = purpose.trim();
        let mission_scope = mission_scope.trim();
        if role.as_str().trim().is_empty() {
            return Err(PassportError::Validation("role must not be empty".into()));
        }
        if purpose.is_empty() {
            return Err(PassportError::Validation("purpose must not be empty".into()));
        }
        if mission_scope.is_empty() {
            return Err(PassportError::Validation(
                "missionScope must not be empty".into(),
            ));
        }

        let issued_at = time::now_rfc3339();
        let signature = self.sign(&agent_id, &issued_at);

        let passport = Passport {
            agent_id,
            role,
            purpose: purpose.to_string(),
            mission_scope: mission_scope.to_string(),
            issued_at,
            signature,
            status: PassportStatus::Active,
            action_count: 0,
            last_action_at: None,
        };

        time::bounded(
            self.config.ledger_timeout,
            "ledger register_agent",
            self.ledger.register_agent(&passport),
        )
        .await
        .map_err(|e| PassportError::IssuanceFailed(e.to_string()))?;

        log::info!(
            "issued passport {} (role {}, scope {})",
            passport.agent_id,
            passport.role,
            passport.mission_scope
        );
        Ok(passport)
    }

    /// Check a passport's signature against the secret key.
    ///
    /// Never fails: malformed input (empty id or timestamp, non-hex or
    /// wrong-length signature) simply returns `false`.
    pub fn verify_passport(&self, passport: &Passport) -> bool {
        if passport.agent_id.as_str().is_empty() || passport.issued_at.is_empty() {
            return false;
        }
        let Ok(submitted) = hex::decode(&passport.signature) else {
            return false;
        };
        if submitted.len() != MAC_LEN {
            return false;
        }
        let expected = mac::compute_mac(
            &self.config.secret_key,
            &[
                passport.agent_id.as_str().as_bytes(),
                passport.issued_at.as_bytes(),
            ],
        );
        mac::constant_time_eq(&expected, &submitted)
    }

    /// Fetch the authoritative passport from the ledger.
    pub async fn get(&self, agent_id: &AgentId) -> Result<Passport> {
        time::bounded(
            self.config.ledger_timeout,
            "ledger get_passport",
            self.ledger.get_passport(agent_id),
        )
        .await
    }

    /// List every registered passport.
    pub async fn list(&self) -> Result<Vec<Passport>> {
        time::bounded(
            self.config.ledger_timeout,
            "ledger get_all_agents",
            self.ledger.get_all_agents(),
        )
        .await
    }

    /// Mark a passport as revoked. Takes effect on the next authorization.
    pub async fn revoke(&self, agent_id: &AgentId) -> Result<()> {
        time::bounded(
            self.config.ledger_timeout,
            "ledger revoke_agent",
            self.ledger.revoke_agent(agent_id),
        )
        .await?;
        log::info!("revoked passport {agent_id}");
        Ok(())
    }
}

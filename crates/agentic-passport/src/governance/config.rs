//! Governance wrapper configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PassportError, Result};

/// Default per-call deadline for the audit endpoint.
pub const DEFAULT_GOVERNANCE_TIMEOUT_MS: u64 = 5_000;

/// How audit failures affect the wrapped call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplianceMode {
    /// Failures are logged and swallowed; execution always proceeds.
    #[default]
    Learning,
    /// Registration or pre-check failure aborts before execution.
    Enforcing,
    /// Non-blocking like `Learning`; differs only in how events are labelled.
    AuditOnly,
}

impl ComplianceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Learning => "learning",
            Self::Enforcing => "enforcing",
            Self::AuditOnly => "audit-only",
        }
    }

    /// Whether governance failures block the wrapped capability.
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Enforcing)
    }
}

impl std::fmt::Display for ComplianceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComplianceMode {
    type Err = PassportError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "learning" => Ok(Self::Learning),
            "enforcing" => Ok(Self::Enforcing),
            "audit-only" => Ok(Self::AuditOnly),
            other => Err(PassportError::Config(format!(
                "unknown compliance mode: {other}"
            ))),
        }
    }
}

fn default_timeout_ms() -> u64 {
    DEFAULT_GOVERNANCE_TIMEOUT_MS
}

/// Where and how a wrapped agent reports to its governance endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceConfig {
    pub endpoint: String,
    pub agent_id: String,
    pub mission_scope: String,
    #[serde(default)]
    pub compliance_mode: ComplianceMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl GovernanceConfig {
    pub fn new(
        endpoint: impl Into<String>,
        agent_id: impl Into<String>,
        mission_scope: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            agent_id: agent_id.into(),
            mission_scope: mission_scope.into(),
            compliance_mode: ComplianceMode::default(),
            api_key: None,
            timeout_ms: DEFAULT_GOVERNANCE_TIMEOUT_MS,
        }
    }

    pub fn with_mode(mut self, mode: ComplianceMode) -> Self {
        self.compliance_mode = mode;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Reject configurations that could never reach an endpoint.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("endpoint", &self.endpoint),
            ("agentId", &self.agent_id),
            ("missionScope", &self.mission_scope),
        ] {
            if value.trim().is_empty() {
                return Err(PassportError::Config(format!("{name} must not be empty")));
            }
        }
        if self.timeout_ms == 0 {
            return Err(PassportError::Config("timeoutMs must be positive".into()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for GovernanceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GovernanceConfig")
            .field("endpoint", &self.endpoint)
            .field("agent_id", &self.agent_id)
            .field("mission_scope", &self.mission_scope)
            .field("compliance_mode", &self.compliance_mode)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

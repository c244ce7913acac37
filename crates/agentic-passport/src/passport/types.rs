//! Passport record and its field types.
//!
//! JSON field names are fixed: `agentId`, `role`, `purpose`,
//! `missionScope`, `issuedAt`, `signature`, `status`, `actionCount`,
//! `lastActionAt`. The ledger stores exactly this shape.

use serde::{Deserialize, Serialize};

/// Opaque unique identifier for an agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Agent role. Open-ended: unrecognised names round-trip as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    ReadOnly,
    DataProcessor,
    Admin,
    Custom(String),
}

impl Role {
    /// Return the stable wire name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::ReadOnly => "ReadOnly",
            Self::DataProcessor => "DataProcessor",
            Self::Admin => "Admin",
            Self::Custom(s) => s.as_str(),
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.as_str() {
            "ReadOnly" => Self::ReadOnly,
            "DataProcessor" => Self::DataProcessor,
            "Admin" => Self::Admin,
            _ => Self::Custom(s),
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Custom(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status. Passports are never deleted, only revoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PassportStatus {
    #[default]
    Active,
    Revoked,
}

/// A signed identity record binding an agent to a role and mission scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passport {
    pub agent_id: AgentId,
    pub role: Role,
    pub purpose: String,
    pub mission_scope: String,
    /// RFC 3339; these exact bytes are covered by the signature.
    pub issued_at: String,
    /// Hex HMAC-SHA256 of `agentId ‖ issuedAt`.
    pub signature: String,
    #[serde(default)]
    pub status: PassportStatus,
    #[serde(default)]
    pub action_count: u64,
    #[serde(default)]
    pub last_action_at: Option<String>,
}

impl Passport {
    pub fn is_active(&self) -> bool {
        self.status == PassportStatus::Active
    }
}

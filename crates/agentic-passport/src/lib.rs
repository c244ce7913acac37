//! AgenticPassport: signed identity passports for AI agents.
//!
//! Issues HMAC-signed passports, authenticates an agent's asserted identity
//! against the authoritative ledger copy, enforces a role-scoped policy over
//! requested actions, and appends a tamper-evident audit entry for every
//! authorized action. Allowlist membership can be attested with a
//! zero-knowledge proof whose proving math is delegated to an external
//! backend, and arbitrary agent calls can be instrumented with a
//! best-effort governance audit pipeline.

pub mod audit;
pub mod authorizer;
pub mod config;
pub mod crypto;
pub mod error;
pub mod governance;
pub mod ledger;
pub mod membership;
pub mod passport;
pub mod policy;
pub mod time;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export primary types
pub use audit::{AuditEntry, AuditResult, Intent, LogId, TxId};
pub use authorizer::{ActionAuthorizer, AuthorizationStage, Authorization, Denial, DenialReason};
pub use config::PassportConfig;
pub use error::{PassportError, Result};
pub use ledger::{AuditLedger, FileLedger, MemoryLedger};
pub use passport::{AgentId, Passport, PassportRegistry, PassportStatus, Role};
pub use policy::{Decision, PolicyEngine};

// Re-export membership types
pub use membership::{
    proof_hash, CircuitArtifacts, MembershipProof, MembershipProofService, MembershipWitness,
    MerkleAllowlist, ProvingBackend, PublicSignals, RemoteProver, TransparentBackend,
    VerificationKey,
};

// Re-export governance types
pub use governance::{
    AgentCapability, AuditSink, ComplianceMode, GovernanceConfig, GovernanceEvent,
    GovernanceWrapper, GovernedError, HttpAuditSink, StreamingCapability,
};

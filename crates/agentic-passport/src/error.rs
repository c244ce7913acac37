//! Error types for AgenticPassport.
//!
//! Only transport and infrastructure failures travel through this channel.
//! Authorization denials are ordinary values (see
//! [`crate::authorizer::Authorization`]) so callers cannot confuse "policy
//! said no" with "the ledger is down". Secret key material is never
//! included in error messages.

/// Error type covering every fallible operation in the crate.
#[derive(Debug, thiserror::Error)]
pub enum PassportError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Passport issuance failed: {0}")]
    IssuanceFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Timed out waiting for {0}")]
    Timeout(String),

    #[error("Execution failed after authorization: {0}")]
    ExecutionFailed(String),

    #[error("Allowlist is empty")]
    EmptyAllowlist,

    #[error("Allowlist holds {len} leaves but depth allows only {capacity}")]
    AllowlistOverflow { len: usize, capacity: usize },

    #[error("Agent is not in the allowlist")]
    NotInAllowlist,

    #[error("Proving backend error: {0}")]
    Prover(String),

    #[error("Proof verification failed")]
    ProofVerificationFailed,

    #[error("Governance check failed: {0}")]
    Governance(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for PassportError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, PassportError>;

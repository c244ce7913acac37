//! Shared handler state.

use std::sync::Arc;

use agentic_passport::{
    ActionAuthorizer, AuditLedger, CircuitArtifacts, MembershipProofService, MerkleAllowlist,
    PassportConfig, PassportRegistry, Result, TransparentBackend, VerificationKey,
};

/// Circuit identifier for allowlist membership proofs.
pub const MEMBERSHIP_CIRCUIT_ID: &str = "allowlist-membership";

/// Everything a handler needs. Cheap to clone: every field is shared.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PassportConfig>,
    pub registry: Arc<PassportRegistry>,
    pub authorizer: Arc<ActionAuthorizer>,
    pub membership: Arc<MembershipProofService>,
    /// `None` when the server was started without an allowlist.
    pub allowlist: Option<Arc<MerkleAllowlist>>,
    pub verification_key: VerificationKey,
    pub ledger: Arc<dyn AuditLedger>,
}

impl AppState {
    /// Wire up the registry, authorizer and a transparent membership
    /// backend over `ledger`. An empty `allowlist` disables the membership
    /// proving route.
    pub fn with_transparent_backend(
        config: Arc<PassportConfig>,
        ledger: Arc<dyn AuditLedger>,
        allowlist: &[String],
    ) -> Result<Self> {
        let backend = TransparentBackend::new(config.secret_key.derive("membership-prover"));
        let verification_key = backend.verification_key(MEMBERSHIP_CIRCUIT_ID);
        let membership = MembershipProofService::new(
            config.clone(),
            Arc::new(backend),
            CircuitArtifacts::new(MEMBERSHIP_CIRCUIT_ID),
        );
        let allowlist = if allowlist.is_empty() {
            None
        } else {
            Some(Arc::new(membership.build_allowlist(allowlist.iter().cloned())?))
        };

        Ok(Self {
            registry: Arc::new(PassportRegistry::new(config.clone(), ledger.clone())),
            authorizer: Arc::new(ActionAuthorizer::new(config.clone(), ledger.clone())),
            config,
            membership: Arc::new(membership),
            allowlist,
            verification_key,
            ledger,
        })
    }
}

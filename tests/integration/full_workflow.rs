//! Integration test: full end-to-end workflow.
//!
//! Tests the complete lifecycle:
//! 1. Issue passports
//! 2. Authorize actions against role policy
//! 3. Read back the audit trail
//! 4. Revoke and confirm the next call is denied
//! 5. Prove and verify allowlist membership

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use agentic_passport::crypto::MacKey;
use agentic_passport::{
    ActionAuthorizer, AuditLedger, AuditResult, Authorization, CircuitArtifacts, DenialReason,
    FileLedger, Intent, MembershipProof, MembershipProofService, MembershipWitness,
    MemoryLedger, PassportConfig, PassportError, PassportRegistry, ProvingBackend,
    PublicSignals, Role, TransparentBackend, VerificationKey,
};
use async_trait::async_trait;

fn config() -> Arc<PassportConfig> {
    Arc::new(PassportConfig::new(
        MacKey::new(b"workflow-secret".to_vec()).expect("non-empty key"),
    ))
}

#[tokio::test]
async fn full_workflow_issue_execute_revoke() {
    let config = config();
    let ledger: Arc<dyn AuditLedger> = Arc::new(MemoryLedger::new());
    let registry = PassportRegistry::new(config.clone(), ledger.clone());
    let authorizer = ActionAuthorizer::new(config.clone(), ledger.clone());

    // ── Step 1: Issue passports ─────────────────────────────────────────
    let reader = registry
        .issue_passport(Role::ReadOnly, "Nightly billing report", "billing-reports")
        .await
        .expect("issuance should succeed");
    let admin = registry
        .issue_passport(Role::Admin, "Operations", "ops")
        .await
        .expect("issuance should succeed");

    assert_ne!(reader.agent_id, admin.agent_id);
    assert!(registry.verify_passport(&reader));
    assert!(registry.verify_passport(&admin));
    assert_eq!(reader.action_count, 0);

    // ── Step 2: Authorize actions ───────────────────────────────────────
    let write = authorizer
        .execute(&reader, &Intent::new("WRITE", "billing-db"))
        .await
        .expect("denial is not an error");
    let denial = write.denial().expect("ReadOnly may not WRITE");
    assert!(matches!(
        denial.reason,
        DenialReason::PolicyViolation { ref action, .. } if action == "WRITE"
    ));

    let read = authorizer
        .execute(&reader, &Intent::new("READ", "billing-db"))
        .await
        .expect("read should succeed");
    let tx_id = read.tx_id().expect("READ is allowed").clone();

    let delete = authorizer
        .execute(&admin, &Intent::new("DELETE", "stale-cache"))
        .await
        .expect("admin delete should succeed");
    assert!(delete.is_allowed());

    // ── Step 3: Audit trail ─────────────────────────────────────────────
    let logs = ledger.list_logs().await.unwrap();
    assert_eq!(logs.len(), 2, "denials are not appended");
    assert_eq!(logs[0].log_id.0, tx_id.0);
    assert_eq!(logs[0].agent_id, reader.agent_id);
    assert_eq!(logs[0].action, "READ");
    assert_eq!(logs[0].result, AuditResult::Allowed);
    assert!(logs[0].passport_valid);

    let official = registry.get(&reader.agent_id).await.unwrap();
    assert_eq!(official.action_count, 1);
    assert_eq!(official.last_action_at.as_deref(), Some(logs[0].timestamp.as_str()));

    // ── Step 4: Revoke ──────────────────────────────────────────────────
    registry.revoke(&reader.agent_id).await.unwrap();
    let after = authorizer
        .execute(&reader, &Intent::new("READ", "billing-db"))
        .await
        .unwrap();
    assert!(matches!(
        after,
        Authorization::Denied(ref d) if d.reason == DenialReason::PassportRevoked
    ));
    assert_eq!(ledger.list_logs().await.unwrap().len(), 2);
    assert!(registry.verify_passport(&reader), "revocation does not touch the signature");
}

#[tokio::test]
async fn full_workflow_on_file_ledger_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = config();

    let (agent_id, tx_id) = {
        let ledger: Arc<dyn AuditLedger> = Arc::new(FileLedger::open(dir.path()).unwrap());
        let registry = PassportRegistry::new(config.clone(), ledger.clone());
        let authorizer = ActionAuthorizer::new(config.clone(), ledger);
        let passport = registry
            .issue_passport(Role::DataProcessor, "ETL", "warehouse")
            .await
            .unwrap();
        let outcome = authorizer
            .execute(&passport, &Intent::new("PROCESS", "orders"))
            .await
            .unwrap();
        (passport.agent_id, outcome.tx_id().unwrap().clone())
    };

    let ledger = FileLedger::open(dir.path()).unwrap();
    let passport = ledger.get_passport(&agent_id).await.unwrap();
    assert_eq!(passport.action_count, 1);
    let entry = ledger
        .get_log(&agentic_passport::LogId(tx_id.0.clone()))
        .await
        .unwrap();
    assert_eq!(entry.action, "PROCESS");
}

/// Transparent backend that counts how often it is asked to prove.
struct CountingBackend {
    inner: TransparentBackend,
    proves: AtomicUsize,
}

#[async_trait]
impl ProvingBackend for CountingBackend {
    async fn prove(
        &self,
        witness: &MembershipWitness,
        artifacts: &CircuitArtifacts,
    ) -> agentic_passport::Result<(MembershipProof, PublicSignals)> {
        self.proves.fetch_add(1, Ordering::SeqCst);
        self.inner.prove(witness, artifacts).await
    }

    async fn verify(
        &self,
        proof: &MembershipProof,
        signals: &PublicSignals,
        vk: &VerificationKey,
    ) -> agentic_passport::Result<bool> {
        self.inner.verify(proof, signals, vk).await
    }
}

#[tokio::test]
async fn full_workflow_membership() {
    let config = config();
    let inner = TransparentBackend::new(config.secret_key.derive("membership-prover"));
    let vk = inner.verification_key("allowlist-membership");
    let backend = Arc::new(CountingBackend {
        inner,
        proves: AtomicUsize::new(0),
    });
    let service = MembershipProofService::new(
        config,
        backend.clone(),
        CircuitArtifacts::new("allowlist-membership"),
    );

    let tree = service.build_allowlist(["100", "101", "111"]).unwrap();
    assert_eq!(tree.capacity(), 8);

    // ── Members prove and verify ────────────────────────────────────────
    for id in ["100", "101", "111"] {
        let (proof, signals) = service.prove(&tree, id).await.unwrap();
        assert_eq!(signals.merkle_root(), Some(tree.root_hex().as_str()));
        assert!(service.verify(&proof, &signals, &vk).await);
        assert!(
            service
                .verify_against_root(&proof, &signals, &vk, &tree.root_hex())
                .await
        );
    }
    assert_eq!(backend.proves.load(Ordering::SeqCst), 3);

    // ── A non-member never reaches the backend ──────────────────────────
    let err = service.prove(&tree, "999").await.unwrap_err();
    assert!(matches!(err, PassportError::NotInAllowlist));
    assert_eq!(backend.proves.load(Ordering::SeqCst), 3);

    // ── A proof from a different allowlist does not pass this root ──────
    let other = service.build_allowlist(["200"]).unwrap();
    let (proof, signals) = service.prove(&other, "200").await.unwrap();
    assert!(
        !service
            .verify_against_root(&proof, &signals, &vk, &tree.root_hex())
            .await
    );
}

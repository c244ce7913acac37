//! Edge cases: malformed input, single-field mutation, and boundary
//! conditions for registration, authorization and allowlists.

use std::sync::Arc;

use agentic_passport::crypto::MacKey;
use agentic_passport::{
    ActionAuthorizer, AgentId, DenialReason, Intent, MemoryLedger, MerkleAllowlist, Passport,
    PassportConfig, PassportError, PassportRegistry, PassportStatus, Role,
};

fn setup() -> (PassportRegistry, ActionAuthorizer) {
    let config = Arc::new(PassportConfig::new(
        MacKey::new(b"edge-secret".to_vec()).unwrap(),
    ));
    let ledger = Arc::new(MemoryLedger::new());
    (
        PassportRegistry::new(config.clone(), ledger.clone()),
        ActionAuthorizer::new(config, ledger),
    )
}

async fn issue(registry: &PassportRegistry, role: Role) -> Passport {
    registry
        .issue_passport(role, "edge cases", "edge-scope")
        .await
        .unwrap()
}

// ── Malformed signatures ────────────────────────────────────────────────

#[tokio::test]
async fn edge_malformed_signatures_fail_verification() {
    let (registry, _) = setup();
    let passport = issue(&registry, Role::ReadOnly).await;

    let bad_signatures = vec![
        String::new(),
        "zz".to_string(),
        "not-hex-at-all".to_string(),
        passport.signature[..62].to_string(),
        format!("{}00", passport.signature),
        "0".repeat(63),
    ];
    for bad in bad_signatures {
        let mut p = passport.clone();
        p.signature = bad.clone();
        assert!(!registry.verify_passport(&p), "signature {bad:?} must not verify");
    }
}

#[tokio::test]
async fn edge_empty_identity_fields_fail_verification() {
    let (registry, _) = setup();
    let passport = issue(&registry, Role::ReadOnly).await;

    let mut no_id = passport.clone();
    no_id.agent_id = AgentId::new("");
    assert!(!registry.verify_passport(&no_id));

    let mut no_time = passport.clone();
    no_time.issued_at = String::new();
    assert!(!registry.verify_passport(&no_time));
}

// ── Single-field mutation ───────────────────────────────────────────────

#[tokio::test]
async fn edge_mutating_a_signed_field_breaks_the_signature() {
    let (registry, _) = setup();
    let passport = issue(&registry, Role::ReadOnly).await;

    let mut id = passport.clone();
    id.agent_id = AgentId::new(format!("{}x", passport.agent_id));
    assert!(!registry.verify_passport(&id));

    let mut issued = passport.clone();
    issued.issued_at = issued.issued_at.replacen('Z', "+00:00", 1);
    assert!(!registry.verify_passport(&issued));

    let mut sig = passport.clone();
    let mut bytes = hex::decode(&sig.signature).unwrap();
    bytes[16] ^= 0x80;
    sig.signature = hex::encode(bytes);
    assert!(!registry.verify_passport(&sig));
}

#[tokio::test]
async fn edge_mutating_an_unsigned_field_grants_nothing() {
    let (registry, authorizer) = setup();
    let passport = issue(&registry, Role::ReadOnly).await;

    let mutations: Vec<Box<dyn Fn(&mut Passport)>> = vec![
        Box::new(|p| p.role = Role::Admin),
        Box::new(|p| p.role = Role::DataProcessor),
        Box::new(|p| p.purpose = "anything".into()),
        Box::new(|p| p.mission_scope = "everything".into()),
        Box::new(|p| p.action_count = 1_000),
        Box::new(|p| p.status = PassportStatus::Revoked),
    ];
    for mutate in mutations {
        let mut p = passport.clone();
        mutate(&mut p);
        let outcome = authorizer
            .execute(&p, &Intent::new("DELETE", "prod-db"))
            .await
            .unwrap();
        assert!(
            matches!(
                outcome.denial().map(|d| &d.reason),
                Some(DenialReason::PolicyViolation { role: Role::ReadOnly, .. })
            ),
            "the ledger role decides, got {outcome:?}"
        );
    }
}

#[tokio::test]
async fn edge_another_agents_signature_is_a_mismatch() {
    let (registry, authorizer) = setup();
    let reader = issue(&registry, Role::ReadOnly).await;
    let admin = issue(&registry, Role::Admin).await;

    let mut spliced = reader.clone();
    spliced.signature = admin.signature.clone();
    let outcome = authorizer
        .execute(&spliced, &Intent::new("READ", "x"))
        .await
        .unwrap();
    assert_eq!(
        outcome.denial().unwrap().reason,
        DenialReason::IdentityMismatch
    );
}

// ── Intents and actions ─────────────────────────────────────────────────

#[tokio::test]
async fn edge_blank_intent_fields_are_validation_errors() {
    let (registry, authorizer) = setup();
    let passport = issue(&registry, Role::Admin).await;

    for intent in [
        Intent::new("", "target"),
        Intent::new("   ", "target"),
        Intent::new("READ", ""),
        Intent::new("READ", "\t"),
    ] {
        let err = authorizer.execute(&passport, &intent).await.unwrap_err();
        assert!(matches!(err, PassportError::Validation(_)), "{intent:?}");
    }
}

#[tokio::test]
async fn edge_actions_match_exactly() {
    let (registry, authorizer) = setup();
    let passport = issue(&registry, Role::Admin).await;

    for action in ["read", "Read", " READ", "READ ", "EXECUTE", "ADMIN"] {
        let outcome = authorizer
            .execute(&passport, &Intent::new(action, "x"))
            .await
            .unwrap();
        assert!(!outcome.is_allowed(), "{action:?} must not be allowed");
    }
}

#[tokio::test]
async fn edge_custom_role_may_do_nothing() {
    let (registry, authorizer) = setup();
    let passport = issue(&registry, Role::Custom("Auditor".into())).await;
    assert_eq!(passport.role, Role::Custom("Auditor".into()));

    for action in ["READ", "WRITE", "PROCESS", "DELETE"] {
        let outcome = authorizer
            .execute(&passport, &Intent::new(action, "x"))
            .await
            .unwrap();
        assert!(!outcome.is_allowed());
    }
}

// ── Registration ────────────────────────────────────────────────────────

#[tokio::test]
async fn edge_registration_rejects_blank_fields() {
    let (registry, _) = setup();
    let cases = [
        (Role::Custom(String::new()), "purpose", "scope"),
        (Role::Custom("  ".into()), "purpose", "scope"),
        (Role::ReadOnly, "", "scope"),
        (Role::ReadOnly, "purpose", " "),
    ];
    for (role, purpose, scope) in cases {
        let err = registry
            .issue_passport(role, purpose, scope)
            .await
            .unwrap_err();
        assert!(matches!(err, PassportError::Validation(_)));
    }
    assert!(registry.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn edge_issued_ids_are_unique() {
    let (registry, _) = setup();
    let mut ids = std::collections::HashSet::new();
    for _ in 0..100 {
        assert!(ids.insert(issue(&registry, Role::ReadOnly).await.agent_id));
    }
}

#[test]
fn edge_passport_json_defaults() {
    let json = r#"{
        "agentId": "agent_x",
        "role": "DataProcessor",
        "purpose": "p",
        "missionScope": "s",
        "issuedAt": "2025-01-01T00:00:00.000Z",
        "signature": "00"
    }"#;
    let p: Passport = serde_json::from_str(json).unwrap();
    assert_eq!(p.status, PassportStatus::Active);
    assert_eq!(p.action_count, 0);
    assert!(p.last_action_at.is_none());
    assert_eq!(p.role, Role::DataProcessor);

    assert!(serde_json::from_str::<Passport>(r#"{"agentId":"a"}"#).is_err());
}

// ── Allowlists ──────────────────────────────────────────────────────────

#[test]
fn edge_allowlist_boundaries() {
    assert!(matches!(
        MerkleAllowlist::build(Vec::<String>::new(), 3),
        Err(PassportError::EmptyAllowlist)
    ));

    let full: Vec<String> = (0..8).map(|i| format!("agent-{i}")).collect();
    let tree = MerkleAllowlist::build(full.clone(), 3).unwrap();
    assert_eq!(tree.len(), tree.capacity());
    assert!(tree.witness("agent-7").unwrap().is_consistent());

    let mut over = full;
    over.push("agent-8".into());
    assert!(matches!(
        MerkleAllowlist::build(over, 3),
        Err(PassportError::AllowlistOverflow { len: 9, capacity: 8 })
    ));

    assert!(matches!(
        MerkleAllowlist::build(["a", "a"], 3),
        Err(PassportError::Validation(_))
    ));
    assert!(matches!(
        MerkleAllowlist::build(["a"], 0),
        Err(PassportError::Validation(_))
    ));
}

#[test]
fn edge_single_leaf_allowlist() {
    let tree = MerkleAllowlist::build(["only"], 1).unwrap();
    let witness = tree.witness("only").unwrap();
    assert_eq!(witness.path_elements.len(), 1);
    assert_eq!(witness.compute_root().unwrap(), tree.root_hex());
    assert!(matches!(
        tree.witness("other"),
        Err(PassportError::NotInAllowlist)
    ));
}

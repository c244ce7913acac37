//! Stress test: concurrent authorizations against one ledger.
//!
//! Counters must equal the number of allowed calls, ids must stay unique,
//! and signature comparison time must not depend on where a mismatch is.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use agentic_passport::crypto::MacKey;
use agentic_passport::{
    ActionAuthorizer, AuditLedger, DenialReason, Intent, MemoryLedger, Passport, PassportConfig,
    PassportRegistry, Role,
};

struct Harness {
    registry: Arc<PassportRegistry>,
    authorizer: Arc<ActionAuthorizer>,
    ledger: Arc<MemoryLedger>,
}

fn harness() -> Harness {
    let config = Arc::new(PassportConfig::new(
        MacKey::new(b"stress-secret".to_vec()).unwrap(),
    ));
    let ledger = Arc::new(MemoryLedger::new());
    Harness {
        registry: Arc::new(PassportRegistry::new(config.clone(), ledger.clone())),
        authorizer: Arc::new(ActionAuthorizer::new(config, ledger.clone())),
        ledger,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stress_200_concurrent_executes_one_agent() {
    let h = harness();
    let passport = h
        .registry
        .issue_passport(Role::DataProcessor, "ETL", "warehouse")
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for i in 0..200 {
        let authorizer = h.authorizer.clone();
        let passport = passport.clone();
        tasks.push(tokio::spawn(async move {
            let action = if i % 2 == 0 { "READ" } else { "PROCESS" };
            authorizer
                .execute(&passport, &Intent::new(action, format!("shard-{i}")))
                .await
                .unwrap()
        }));
    }

    let mut tx_ids = HashSet::new();
    for task in tasks {
        let outcome = task.await.unwrap();
        let tx_id = outcome.tx_id().expect("every call is allowed").clone();
        assert!(tx_ids.insert(tx_id.0), "tx ids must be unique");
    }
    assert_eq!(tx_ids.len(), 200);

    let official = h.registry.get(&passport.agent_id).await.unwrap();
    assert_eq!(official.action_count, 200);
    assert_eq!(h.ledger.list_logs().await.unwrap().len(), 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stress_many_agents_mixed_outcomes() {
    let h = harness();
    let mut passports = Vec::new();
    for i in 0..20 {
        let role = if i % 2 == 0 { Role::ReadOnly } else { Role::Admin };
        passports.push(
            h.registry
                .issue_passport(role, "mixed", "scope")
                .await
                .unwrap(),
        );
    }

    let mut tasks = Vec::new();
    for passport in &passports {
        for _ in 0..10 {
            let authorizer = h.authorizer.clone();
            let passport = passport.clone();
            tasks.push(tokio::spawn(async move {
                authorizer
                    .execute(&passport, &Intent::new("WRITE", "records"))
                    .await
                    .unwrap()
                    .is_allowed()
            }));
        }
    }
    let mut allowed = 0;
    for task in tasks {
        if task.await.unwrap() {
            allowed += 1;
        }
    }
    assert_eq!(allowed, 100, "only the admins may WRITE");

    for passport in &passports {
        let official = h.registry.get(&passport.agent_id).await.unwrap();
        let expected = if passport.role == Role::Admin { 10 } else { 0 };
        assert_eq!(official.action_count, expected);
    }
}

#[tokio::test]
async fn stress_action_count_is_monotonic() {
    let h = harness();
    let passport = h
        .registry
        .issue_passport(Role::Admin, "counter", "scope")
        .await
        .unwrap();

    let mut last_count = 0;
    let mut last_at: Option<String> = None;
    for i in 0..100 {
        // Denials in between must not move the counter.
        if i % 10 == 0 {
            let mut forged = passport.clone();
            forged.signature = "ff".repeat(32);
            let outcome = h
                .authorizer
                .execute(&forged, &Intent::new("READ", "x"))
                .await
                .unwrap();
            assert_eq!(
                outcome.denial().unwrap().reason,
                DenialReason::IdentityMismatch
            );
        }
        h.authorizer
            .execute(&passport, &Intent::new("READ", "x"))
            .await
            .unwrap();
        let official = h.registry.get(&passport.agent_id).await.unwrap();
        assert_eq!(official.action_count, last_count + 1);
        let at = official.last_action_at.clone().unwrap();
        if let Some(prev) = &last_at {
            assert!(at >= *prev, "lastActionAt must not move backwards");
        }
        last_count = official.action_count;
        last_at = Some(at);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stress_revocation_is_seen_by_later_calls() {
    let h = harness();
    let passport = h
        .registry
        .issue_passport(Role::Admin, "revoke", "scope")
        .await
        .unwrap();

    let before = h
        .authorizer
        .execute(&passport, &Intent::new("READ", "x"))
        .await
        .unwrap();
    assert!(before.is_allowed());

    h.registry.revoke(&passport.agent_id).await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..50 {
        let authorizer = h.authorizer.clone();
        let passport = passport.clone();
        tasks.push(tokio::spawn(async move {
            authorizer
                .execute(&passport, &Intent::new("READ", "x"))
                .await
                .unwrap()
        }));
    }
    for task in tasks {
        let outcome = task.await.unwrap();
        assert_eq!(
            outcome.denial().unwrap().reason,
            DenialReason::PassportRevoked
        );
    }
    assert_eq!(h.ledger.list_logs().await.unwrap().len(), 1);
}

fn time_verify(registry: &PassportRegistry, passport: &Passport, rounds: usize) -> Duration {
    let start = Instant::now();
    for _ in 0..rounds {
        std::hint::black_box(registry.verify_passport(std::hint::black_box(passport)));
    }
    start.elapsed()
}

#[tokio::test]
async fn stress_signature_check_timing_is_position_independent() {
    let h = harness();
    let passport = h
        .registry
        .issue_passport(Role::ReadOnly, "timing", "scope")
        .await
        .unwrap();

    let flip = |pos: usize| {
        let mut p = passport.clone();
        let mut bytes = hex::decode(&p.signature).unwrap();
        bytes[pos] ^= 0x01;
        p.signature = hex::encode(bytes);
        p
    };
    let early = flip(0);
    let late = flip(31);
    assert!(!h.registry.verify_passport(&early));
    assert!(!h.registry.verify_passport(&late));

    // Warm up, then take the best of several runs to damp scheduler noise.
    time_verify(&h.registry, &early, 1_000);
    time_verify(&h.registry, &late, 1_000);
    let best = |p: &Passport| {
        (0..5)
            .map(|_| time_verify(&h.registry, p, 5_000))
            .min()
            .unwrap()
    };
    let t_early = best(&early).as_nanos() as f64;
    let t_late = best(&late).as_nanos() as f64;
    let ratio = t_early.max(t_late) / t_early.min(t_late).max(1.0);
    assert!(
        ratio < 3.0,
        "mismatch position changed verification time by {ratio:.2}x"
    );
}

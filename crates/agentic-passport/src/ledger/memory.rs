//! In-process ledger for tests and development.
//!
//! Records are held as JSON strings, the same wire form an external ledger
//! would store, so every read deserializes a fresh copy and no caller can
//! hold a reference into ledger state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::audit::{AuditEntry, LogId, TxId};
use crate::error::{PassportError, Result};
use crate::passport::{AgentId, Passport, PassportStatus};

use super::AuditLedger;

#[derive(Default)]
struct Tables {
    agents: HashMap<String, String>,
    agent_order: Vec<String>,
    logs: HashMap<String, String>,
    log_order: Vec<String>,
}

/// A ledger that lives entirely in memory.
///
/// Carries a few knobs for exercising failure paths: forced write or read
/// failures and an artificial per-call latency.
#[derive(Default)]
pub struct MemoryLedger {
    tables: RwLock<Tables>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    latency_ms: AtomicU64,
    calls: AtomicUsize,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `register_agent`, `log_action` and `revoke_agent` fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every read fail with a ledger error.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Delay every call by `latency` before touching state.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(crate::time::saturating_millis(latency), Ordering::SeqCst);
    }

    /// Number of trait calls served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let ms = self.latency_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PassportError::Ledger("ledger unavailable for writes".into()));
        }
        Ok(())
    }

    fn check_read(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(PassportError::Ledger("ledger unavailable for reads".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl AuditLedger for MemoryLedger {
    async fn register_agent(&self, passport: &Passport) -> Result<()> {
        self.enter().await;
        self.check_write()?;

        let key = passport.agent_id.as_str().to_string();
        let json = serde_json::to_string(passport)?;

        let mut t = self.tables.write().await;
        if t.agents.contains_key(&key) {
            return Err(PassportError::Ledger(format!(
                "agent already registered: {key}"
            )));
        }
        t.agents.insert(key.clone(), json);
        t.agent_order.push(key);
        Ok(())
    }

    async fn get_passport(&self, agent_id: &AgentId) -> Result<Passport> {
        self.enter().await;
        self.check_read()?;

        let t = self.tables.read().await;
        let json = t
            .agents
            .get(agent_id.as_str())
            .ok_or_else(|| PassportError::NotFound(format!("agent not found: {agent_id}")))?;
        Ok(serde_json::from_str(json)?)
    }

    async fn log_action(&self, entry: &AuditEntry) -> Result<TxId> {
        self.enter().await;
        self.check_write()?;

        let json = serde_json::to_string(entry)?;
        let mut t = self.tables.write().await;
        if t.logs.contains_key(&entry.log_id.0) {
            return Err(PassportError::Ledger(format!(
                "duplicate log id: {}",
                entry.log_id
            )));
        }

        // Counters move together with the append, under the same lock.
        if entry.result.is_allowed() {
            let key = entry.agent_id.as_str();
            let stored = t
                .agents
                .get(key)
                .ok_or_else(|| PassportError::NotFound(format!("agent not found: {key}")))?;
            let mut passport: Passport = serde_json::from_str(stored)?;
            passport.action_count += 1;
            passport.last_action_at = Some(entry.timestamp.clone());
            let updated = serde_json::to_string(&passport)?;
            t.agents.insert(key.to_string(), updated);
        }

        t.logs.insert(entry.log_id.0.clone(), json);
        t.log_order.push(entry.log_id.0.clone());
        Ok(TxId(entry.log_id.0.clone()))
    }

    async fn get_log(&self, log_id: &LogId) -> Result<AuditEntry> {
        self.enter().await;
        self.check_read()?;

        let t = self.tables.read().await;
        let json = t
            .logs
            .get(&log_id.0)
            .ok_or_else(|| PassportError::NotFound(format!("log not found: {log_id}")))?;
        Ok(serde_json::from_str(json)?)
    }

    async fn list_logs(&self) -> Result<Vec<AuditEntry>> {
        self.enter().await;
        self.check_read()?;

        let t = self.tables.read().await;
        t.log_order
            .iter()
            .filter_map(|id| t.logs.get(id))
            .map(|json| serde_json::from_str(json).map_err(PassportError::from))
            .collect()
    }

    async fn get_all_agents(&self) -> Result<Vec<Passport>> {
        self.enter().await;
        self.check_read()?;

        let t = self.tables.read().await;
        t.agent_order
            .iter()
            .filter_map(|id| t.agents.get(id))
            .map(|json| serde_json::from_str(json).map_err(PassportError::from))
            .collect()
    }

    async fn revoke_agent(&self, agent_id: &AgentId) -> Result<()> {
        self.enter().await;
        self.check_write()?;

        let mut t = self.tables.write().await;
        let stored = t
            .agents
            .get(agent_id.as_str())
            .ok_or_else(|| PassportError::NotFound(format!("agent not found: {agent_id}")))?;
        let mut passport: Passport = serde_json::from_str(stored)?;
        passport.status = PassportStatus::Revoked;
        let updated = serde_json::to_string(&passport)?;
        t.agents.insert(agent_id.as_str().to_string(), updated);
        Ok(())
    }
}

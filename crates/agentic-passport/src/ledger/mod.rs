//! Audit ledger adapter.
//!
//! The ledger is the single source of truth for passports and the
//! append-only store for audit entries. Consensus, replication and global
//! ordering belong to whatever sits behind an implementation of
//! [`AuditLedger`]; this crate ships two local ones.
//!
//! - [`MemoryLedger`]: in-process, for tests and development.
//! - [`FileLedger`]: one JSON file per record on disk.

pub mod file;
pub mod memory;

pub use file::FileLedger;
pub use memory::MemoryLedger;

use async_trait::async_trait;

use crate::audit::{AuditEntry, LogId, TxId};
use crate::error::Result;
use crate::passport::{AgentId, Passport};

/// Operations the rest of the crate needs from a ledger.
///
/// Every call is a potentially remote, potentially slow operation. Callers
/// wrap each one in [`crate::time::bounded`].
#[async_trait]
pub trait AuditLedger: Send + Sync {
    /// Record a freshly issued passport. A duplicate agent id is an error.
    async fn register_agent(&self, passport: &Passport) -> Result<()>;

    /// Fetch the authoritative copy of a passport.
    ///
    /// Returns [`crate::PassportError::NotFound`] for an unknown agent.
    async fn get_passport(&self, agent_id: &AgentId) -> Result<Passport>;

    /// Append an audit entry and return its transaction id.
    ///
    /// For an `Allowed` entry the agent's `actionCount` is incremented by
    /// one and `lastActionAt` set to the entry timestamp in the same
    /// transaction as the append.
    async fn log_action(&self, entry: &AuditEntry) -> Result<TxId>;

    /// Fetch a single audit entry.
    async fn get_log(&self, log_id: &LogId) -> Result<AuditEntry>;

    /// Every audit entry, in append order.
    async fn list_logs(&self) -> Result<Vec<AuditEntry>>;

    /// Every passport, in registration order.
    async fn get_all_agents(&self) -> Result<Vec<Passport>>;

    /// Mark a passport revoked. Unknown agents are `NotFound`.
    async fn revoke_agent(&self, agent_id: &AgentId) -> Result<()>;
}

//! On-disk JSON ledger.
//!
//! Each record is stored as its own JSON file inside the base directory,
//! wrapped with a format version. A small index file keeps registration
//! and append order, which the directory listing cannot provide.
//!
//! ```text
//! {base_dir}/
//! ├── index.json
//! ├── agents/
//! │   └── {agent_id}.json
//! └── logs/
//!     └── {log_id}.json
//! ```
//!
//! Record format:
//! ```json
//! {
//!     "version": 1,
//!     "passport": { ... Passport ... }
//! }
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::audit::{AuditEntry, LogId, TxId};
use crate::error::{PassportError, Result};
use crate::passport::{AgentId, Passport, PassportStatus};

use super::AuditLedger;

// ── File format constants ─────────────────────────────────────────────────────

const LEDGER_FILE_VERSION: u32 = 1;
const INDEX_FILE: &str = "index.json";
const AGENTS_DIR: &str = "agents";
const LOGS_DIR: &str = "logs";

// ── On-disk structures ────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct PassportFile {
    version: u32,
    passport: Passport,
}

#[derive(Debug, Serialize, Deserialize)]
struct LogFile {
    version: u32,
    entry: AuditEntry,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexFile {
    version: u32,
    agents: Vec<String>,
    logs: Vec<String>,
}

// ── FileLedger ────────────────────────────────────────────────────────────────

/// Filesystem-backed ledger.
///
/// All operations go through one async mutex, so writes (including the
/// counter update that accompanies an append) are serialized. Safe for a
/// single process; concurrent processes sharing a directory are not
/// coordinated.
pub struct FileLedger {
    base_dir: PathBuf,
    index: Mutex<IndexFile>,
}

impl FileLedger {
    /// Open a ledger rooted at `base_dir`, creating the layout if missing.
    ///
    /// # Errors
    ///
    /// Returns `PassportError::Io` if directories cannot be created, or
    /// `PassportError::InvalidFileFormat` if an existing index is corrupt.
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(base_dir.join(AGENTS_DIR))?;
        std::fs::create_dir_all(base_dir.join(LOGS_DIR))?;

        let index_path = base_dir.join(INDEX_FILE);
        let index = if index_path.exists() {
            let bytes = std::fs::read(&index_path)?;
            serde_json::from_slice(&bytes).map_err(|e| {
                PassportError::InvalidFileFormat(format!(
                    "failed to parse ledger index {}: {e}",
                    index_path.display()
                ))
            })?
        } else {
            IndexFile {
                version: LEDGER_FILE_VERSION,
                ..IndexFile::default()
            }
        };

        log::debug!(
            "opened file ledger at {} ({} agents, {} logs)",
            base_dir.display(),
            index.agents.len(),
            index.logs.len()
        );
        Ok(Self {
            base_dir,
            index: Mutex::new(index),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn agent_path(&self, id: &str) -> Result<PathBuf> {
        check_file_stem(id)?;
        Ok(self.base_dir.join(AGENTS_DIR).join(format!("{id}.json")))
    }

    fn log_path(&self, id: &str) -> Result<PathBuf> {
        check_file_stem(id)?;
        Ok(self.base_dir.join(LOGS_DIR).join(format!("{id}.json")))
    }

    async fn load_passport(&self, id: &str) -> Result<Passport> {
        let path = self.agent_path(id).map_err(|_| not_found_agent(id))?;
        let file: PassportFile = read_record(&path)
            .await?
            .ok_or_else(|| not_found_agent(id))?;
        Ok(file.passport)
    }

    async fn store_passport(&self, passport: &Passport) -> Result<()> {
        let path = self.agent_path(passport.agent_id.as_str())?;
        write_record(
            &path,
            &PassportFile {
                version: LEDGER_FILE_VERSION,
                passport: passport.clone(),
            },
        )
        .await
    }

    async fn load_entry(&self, id: &str) -> Result<AuditEntry> {
        let not_found = || PassportError::NotFound(format!("log not found: {id}"));
        let path = self.log_path(id).map_err(|_| not_found())?;
        let file: LogFile = read_record(&path).await?.ok_or_else(not_found)?;
        Ok(file.entry)
    }

    async fn save_index(&self, index: &IndexFile) -> Result<()> {
        write_record(&self.base_dir.join(INDEX_FILE), index).await
    }
}

fn not_found_agent(id: &str) -> PassportError {
    PassportError::NotFound(format!("agent not found: {id}"))
}

/// Record ids become file names, so only a conservative alphabet passes.
fn check_file_stem(id: &str) -> Result<()> {
    let ok = !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(PassportError::Validation(format!(
            "identifier not usable as a ledger key: {id:?}"
        )))
    }
}

async fn read_record<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(PassportError::Io(e)),
    };
    serde_json::from_slice(&bytes).map(Some).map_err(|e| {
        PassportError::InvalidFileFormat(format!(
            "failed to parse ledger record {}: {e}",
            path.display()
        ))
    })
}

/// Write via a sibling temp file and rename, so readers never see a torn file.
async fn write_record<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json.as_bytes()).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Best-effort removal of a record written by a transaction that did not
/// commit. The index never names it, so a leftover file stays invisible.
async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!("could not discard {}: {e}", path.display());
        }
    }
}

fn is_listed(ids: &[String], id: &str) -> bool {
    ids.iter().any(|known| known == id)
}

// The index is the commit point: a record file only becomes visible once
// its id is saved in `index.json`. A failed step undoes the earlier ones.
#[async_trait]
impl AuditLedger for FileLedger {
    async fn register_agent(&self, passport: &Passport) -> Result<()> {
        let id = passport.agent_id.as_str().to_string();
        let path = self.agent_path(&id)?;

        let mut index = self.index.lock().await;
        if is_listed(&index.agents, &id) {
            return Err(PassportError::Ledger(format!(
                "agent already registered: {id}"
            )));
        }
        self.store_passport(passport).await?;
        index.agents.push(id);
        if let Err(e) = self.save_index(&index).await {
            index.agents.pop();
            discard(&path).await;
            return Err(e);
        }
        Ok(())
    }

    async fn get_passport(&self, agent_id: &AgentId) -> Result<Passport> {
        let index = self.index.lock().await;
        if !is_listed(&index.agents, agent_id.as_str()) {
            return Err(not_found_agent(agent_id.as_str()));
        }
        self.load_passport(agent_id.as_str()).await
    }

    async fn log_action(&self, entry: &AuditEntry) -> Result<TxId> {
        let id = entry.log_id.0.clone();
        let path = self.log_path(&id)?;

        let mut index = self.index.lock().await;
        if is_listed(&index.logs, &id) {
            return Err(PassportError::Ledger(format!("duplicate log id: {id}")));
        }

        // (previous, updated) copies of the passport whose counter moves.
        let counter = if entry.result.is_allowed() {
            let key = entry.agent_id.as_str();
            if !is_listed(&index.agents, key) {
                return Err(not_found_agent(key));
            }
            let previous = self.load_passport(key).await?;
            let mut updated = previous.clone();
            updated.action_count += 1;
            updated.last_action_at = Some(entry.timestamp.clone());
            Some((previous, updated))
        } else {
            None
        };

        write_record(
            &path,
            &LogFile {
                version: LEDGER_FILE_VERSION,
                entry: entry.clone(),
            },
        )
        .await?;

        if let Some((_, updated)) = &counter {
            if let Err(e) = self.store_passport(updated).await {
                discard(&path).await;
                return Err(e);
            }
        }

        index.logs.push(id.clone());
        if let Err(e) = self.save_index(&index).await {
            index.logs.pop();
            discard(&path).await;
            if let Some((previous, _)) = &counter {
                if let Err(restore) = self.store_passport(previous).await {
                    log::warn!("could not restore counter for {}: {restore}", previous.agent_id);
                }
            }
            return Err(e);
        }

        log::debug!("appended {id} for {}", entry.agent_id);
        Ok(TxId(id))
    }

    async fn get_log(&self, log_id: &LogId) -> Result<AuditEntry> {
        let index = self.index.lock().await;
        if !is_listed(&index.logs, &log_id.0) {
            return Err(PassportError::NotFound(format!("log not found: {log_id}")));
        }
        self.load_entry(&log_id.0).await
    }

    async fn list_logs(&self) -> Result<Vec<AuditEntry>> {
        let index = self.index.lock().await;
        let mut out = Vec::with_capacity(index.logs.len());
        for id in &index.logs {
            out.push(self.load_entry(id).await?);
        }
        Ok(out)
    }

    async fn get_all_agents(&self) -> Result<Vec<Passport>> {
        let index = self.index.lock().await;
        let mut out = Vec::with_capacity(index.agents.len());
        for id in &index.agents {
            out.push(self.load_passport(id).await?);
        }
        Ok(out)
    }

    async fn revoke_agent(&self, agent_id: &AgentId) -> Result<()> {
        let index = self.index.lock().await;
        if !is_listed(&index.agents, agent_id.as_str()) {
            return Err(not_found_agent(agent_id.as_str()));
        }
        let mut passport = self.load_passport(agent_id.as_str()).await?;
        passport.status = PassportStatus::Revoked;
        self.store_passport(&passport).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Process-wide configuration.
//!
//! A single [`PassportConfig`] is built once at startup and shared by
//! reference (`Arc`) with every component. Nothing in the crate reads the
//! environment lazily.
//!
//! # Environment
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `PASSPORT_SECRET_KEY` | raw signing secret | required* |
//! | `PASSPORT_SECRET_KEY_B64` | base64 signing secret | required* |
//! | `PASSPORT_LEDGER_TIMEOUT_MS` | per-call ledger deadline | 5000 |
//! | `PASSPORT_PROVER_TIMEOUT_MS` | per-call proving backend deadline | 30000 |
//! | `PASSPORT_ALLOWLIST_DEPTH` | Merkle allowlist depth | 3 |
//!
//! *exactly one of the two secret variables must be set.

use std::time::Duration;

use crate::crypto::MacKey;
use crate::error::{PassportError, Result};

pub const DEFAULT_LEDGER_TIMEOUT: Duration = Duration::from_millis(5_000);
pub const DEFAULT_PROVER_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_ALLOWLIST_DEPTH: usize = 3;

/// Upper bound on allowlist depth (2^20 leaves).
pub const MAX_ALLOWLIST_DEPTH: usize = 20;

/// Configuration shared by the registry, authorizer, and membership service.
#[derive(Debug, Clone)]
pub struct PassportConfig {
    pub secret_key: MacKey,
    pub ledger_timeout: Duration,
    pub prover_timeout: Duration,
    pub allowlist_depth: usize,
}

impl PassportConfig {
    /// Build a configuration with default timeouts around a secret key.
    pub fn new(secret_key: MacKey) -> Self {
        Self {
            secret_key,
            ledger_timeout: DEFAULT_LEDGER_TIMEOUT,
            prover_timeout: DEFAULT_PROVER_TIMEOUT,
            allowlist_depth: DEFAULT_ALLOWLIST_DEPTH,
        }
    }

    pub fn with_ledger_timeout(mut self, timeout: Duration) -> Self {
        self.ledger_timeout = timeout;
        self
    }

    pub fn with_prover_timeout(mut self, timeout: Duration) -> Self {
        self.prover_timeout = timeout;
        self
    }

    pub fn with_allowlist_depth(mut self, depth: usize) -> Self {
        self.allowlist_depth = depth;
        self
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup (used by `from_env` and tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = match (
            lookup("PASSPORT_SECRET_KEY"),
            lookup("PASSPORT_SECRET_KEY_B64"),
        ) {
            (Some(_), Some(_)) => {
                return Err(PassportError::Config(
                    "set only one of PASSPORT_SECRET_KEY and PASSPORT_SECRET_KEY_B64".into(),
                ))
            }
            (Some(raw), None) => MacKey::new(raw.into_bytes())?,
            (None, Some(b64)) => MacKey::from_base64(&b64)?,
            (None, None) => {
                return Err(PassportError::Config(
                    "PASSPORT_SECRET_KEY or PASSPORT_SECRET_KEY_B64 must be set".into(),
                ))
            }
        };

        let mut config = Self::new(secret_key);
        if let Some(ms) = parse_u64(&lookup, "PASSPORT_LEDGER_TIMEOUT_MS")? {
            config.ledger_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_u64(&lookup, "PASSPORT_PROVER_TIMEOUT_MS")? {
            config.prover_timeout = Duration::from_millis(ms);
        }
        if let Some(depth) = parse_u64(&lookup, "PASSPORT_ALLOWLIST_DEPTH")? {
            let depth = depth as usize;
            if depth == 0 || depth > MAX_ALLOWLIST_DEPTH {
                return Err(PassportError::Config(format!(
                    "PASSPORT_ALLOWLIST_DEPTH must be between 1 and {MAX_ALLOWLIST_DEPTH}"
                )));
            }
            config.allowlist_depth = depth;
        }
        Ok(config)
    }
}

fn parse_u64<F>(lookup: &F, name: &str) -> Result<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(v) => v
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| PassportError::Config(format!("{name}: {e}"))),
    }
}

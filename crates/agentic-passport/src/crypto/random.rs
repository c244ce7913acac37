//! Secure random identifiers.
//!
//! Uses the operating system's cryptographic random source via `rand`.
//! Identifiers are a short type prefix plus base58 of 16 random bytes.

use rand::RngCore;

/// Prefix for generated agent identifiers.
pub const AGENT_ID_PREFIX: &str = "apid_";

/// Prefix for generated audit log identifiers.
pub const LOG_ID_PREFIX: &str = "alog_";

/// Generate a fixed-size array of cryptographically secure random bytes.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    rand::thread_rng().fill_bytes(&mut buf);
    buf
}

fn prefixed_id(prefix: &str) -> String {
    let bytes: [u8; 16] = random_bytes();
    format!("{prefix}{}", bs58::encode(bytes).into_string())
}

/// Generate a fresh agent identifier (`apid_…`).
pub fn new_agent_id() -> String {
    prefixed_id(AGENT_ID_PREFIX)
}

/// Generate a fresh audit log identifier (`alog_…`).
pub fn new_log_id() -> String {
    prefixed_id(LOG_ID_PREFIX)
}

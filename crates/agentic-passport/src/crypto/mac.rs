//! HMAC-SHA256 signing and constant-time comparison.
//!
//! Passport signatures are `HMAC-SHA256(secret, agentId ‖ issuedAt)`,
//! rendered as lowercase hex. Comparisons of signatures always go through
//! [`constant_time_eq`].

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{PassportError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Length of an HMAC-SHA256 tag in bytes.
pub const MAC_LEN: usize = 32;

/// Static secret key used to sign passports.
///
/// The key bytes are zeroized on drop and never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MacKey {
    bytes: Vec<u8>,
}

impl MacKey {
    /// Wrap raw key bytes. An empty key is rejected.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(PassportError::Config("secret key must not be empty".into()));
        }
        Ok(Self { bytes })
    }

    /// Decode a base64-encoded key.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = base64::Engine::decode(
            &base64::engine::general_purpose::STANDARD,
            encoded.trim(),
        )
        .map_err(|e| PassportError::Config(format!("invalid base64 secret key: {e}")))?;
        Self::new(bytes)
    }

    /// Derive an independent subkey for another purpose, so the passport
    /// signing key is never used to sign anything else directly.
    pub fn derive(&self, label: &str) -> MacKey {
        Self {
            bytes: compute_mac(self, &[b"agentic-passport/derive/", label.as_bytes()]).to_vec(),
        }
    }

    fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for MacKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MacKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Compute HMAC-SHA256 over the concatenation of `parts`.
pub fn compute_mac(key: &MacKey, parts: &[&[u8]]) -> [u8; MAC_LEN] {
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    for part in parts {
        mac.update(part);
    }
    let mut out = [0u8; MAC_LEN];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// Compute HMAC-SHA256 and return it as lowercase hex.
pub fn mac_hex(key: &MacKey, parts: &[&[u8]]) -> String {
    hex::encode(compute_mac(key, parts))
}

/// Constant-time byte comparison.
///
/// Unequal lengths return `false` immediately; equal-length inputs are
/// compared without early exit.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

//! Cryptographic primitives for AgenticPassport.
//!
//! This module provides:
//! - HMAC-SHA256 passport signatures under a static secret key
//! - Constant-time byte comparison
//! - Cryptographically secure random identifiers

pub mod mac;
pub mod random;

pub use mac::{constant_time_eq, MacKey};

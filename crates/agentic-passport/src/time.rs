//! Time utilities for AgenticPassport.
//!
//! Timestamps are RFC 3339 UTC strings with millisecond precision, e.g.
//! `2025-06-01T12:00:00.000Z`. Passport signatures cover the exact bytes of
//! `issuedAt`, so timestamps are stored as strings rather than re-rendered.

use std::future::Future;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};

use crate::error::{PassportError, Result};

/// Return the current time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Return the current time as milliseconds since Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
pub fn saturating_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Run an outbound call under a deadline.
///
/// An elapsed deadline becomes [`PassportError::Timeout`] naming `what`;
/// the inner future is dropped, which cancels it.
pub async fn bounded<T, F>(limit: Duration, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(PassportError::Timeout(what.to_string())),
    }
}

//! Governance instrumentation for arbitrary agent calls.
//!
//! A [`GovernanceWrapper`] declares intent before a call and records the
//! outcome after it, against an [`AuditSink`]. It is a best-effort side
//! channel: it never changes what the wrapped agent returns, and in every
//! mode but `enforcing` it never stops a call.

pub mod capability;
pub mod config;
pub mod sink;
pub mod wrapper;

pub use capability::{AgentCapability, StreamingCapability};
pub use config::{ComplianceMode, GovernanceConfig};
pub use sink::{AuditSink, GovernanceEvent, HttpAuditSink};
pub use wrapper::{DeclaredIntent, GovernanceWrapper, GovernedError};

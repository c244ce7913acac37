//! Role-based policy decisions.
//!
//! A static table maps each role to the set of action verbs it may
//! perform. Lookups are pure and total: no I/O, no errors, and any role
//! outside the table is denied everything.

use serde::{Deserialize, Serialize};

use crate::passport::Role;

/// Outcome of a policy lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allow(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Every verb that appears anywhere in the policy table.
pub const KNOWN_ACTIONS: &[&str] = &["READ", "WRITE", "PROCESS", "DELETE"];

const READ_ONLY: &[&str] = &["READ"];
const DATA_PROCESSOR: &[&str] = &["READ", "WRITE", "PROCESS"];
const ADMIN: &[&str] = &["READ", "WRITE", "PROCESS", "DELETE"];
const NOTHING: &[&str] = &[];

/// Table-driven role → allowed-actions policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyEngine;

impl PolicyEngine {
    pub fn new() -> Self {
        Self
    }

    /// Actions permitted for `role`. Unknown roles get an empty set.
    pub fn allowed_actions(role: &Role) -> &'static [&'static str] {
        match role {
            Role::ReadOnly => READ_ONLY,
            Role::DataProcessor => DATA_PROCESSOR,
            Role::Admin => ADMIN,
            Role::Custom(_) => NOTHING,
        }
    }

    /// Decide whether `role` may perform `action`. Verbs match exactly.
    pub fn decision(&self, role: &Role, action: &str) -> Decision {
        if Self::allowed_actions(role).contains(&action) {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

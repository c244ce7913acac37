//! Passports: signed identity records issued to agents.

pub mod registry;
pub mod types;

pub use registry::PassportRegistry;
pub use types::{AgentId, Passport, PassportStatus, Role};

//! Allowlist membership proofs.
//!
//! An agent can attest "I am one of the approved agents" without revealing
//! which one: the allowlist is committed to by a Merkle root, and a proving
//! backend turns the agent's authentication path into a proof against that
//! root.
//!
//! # Modules
//!
//! - [`tree`]: fixed-depth Merkle allowlist.
//! - [`witness`]: authentication paths.
//! - [`backend`]: the [`ProvingBackend`] seam and its data types.
//! - [`transparent`]: keyed deterministic backend for development.
//! - [`remote`]: HTTP client for an external prover.
//! - [`service`]: [`MembershipProofService`], the entry point.

pub mod backend;
pub mod remote;
pub mod service;
pub mod transparent;
pub mod tree;
pub mod witness;

pub use backend::{
    proof_hash, CircuitArtifacts, MembershipProof, ProvingBackend, PublicSignals,
    VerificationKey,
};
pub use remote::RemoteProver;
pub use service::MembershipProofService;
pub use transparent::TransparentBackend;
pub use tree::MerkleAllowlist;
pub use witness::MembershipWitness;

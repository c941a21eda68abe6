//! Typed KDF data model.
//!
//! # Responsibility
//! - Define the artifact shape (sources, document forest, atoms, evidence).
//! - Define the closed issue taxonomy shared by every validator.
//!
//! # Invariants
//! - Artifacts are read-only after decoding; nothing in core repairs them.
//! - Every diagnostic is an `Issue` with a code from `IssueCode`.

pub mod artifact;
pub mod issue;

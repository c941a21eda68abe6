//! Document tree indexing and node-path resolution.
//!
//! # Responsibility
//! - Flatten the document forest into an id-keyed arena with parent slots.
//! - Decide whether a `type:id/...` path is a genuine ancestor chain.
//!
//! # Invariants
//! - Node ids are global across all documents of one artifact.
//! - Resolution is ancestry, not direct parentage: intermediate nodes may be
//!   skipped in a path.

pub mod document;
pub mod path;

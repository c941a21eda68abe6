//! Artifact validation.
//!
//! # Responsibility
//! - `structural`: JSON Schema checks behind the `StructuralCheck` seam.
//! - `evidence`: semantic rules over the decoded artifact.
//! - `markers`: lexical heuristic for inferred payloads.
//! - `pipeline`: merges all issue sources into one verdict.
//!
//! # Invariants
//! - Validation is read-only and never short-circuits.
//! - An artifact is valid iff the merged issue list is empty.

pub mod evidence;
pub mod markers;
pub mod pipeline;
pub mod structural;

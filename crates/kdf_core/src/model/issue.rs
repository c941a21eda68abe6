//! Artifact diagnostics.
//!
//! # Invariants
//! - Issue codes come from a closed set; `IssueCode::as_str` values are
//!   stable wire strings.
//! - An issue never aborts validation; collectors keep every issue.

use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Closed taxonomy of artifact-level diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    /// Structural (schema or decode) violation.
    Schema,
    SourceDup,
    NodeIdDup,
    AtomIdDup,
    NoEvidence,
    InferredAtom,
    BadSource,
    BadNodePath,
    BadNodePathAnchor,
    BadSpan,
    SpanOob,
    ValidNoFp,
    FpMismatchValid,
}

impl IssueCode {
    /// Stable code string used in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Schema => "SCHEMA",
            Self::SourceDup => "SOURCE_DUP",
            Self::NodeIdDup => "NODE_ID_DUP",
            Self::AtomIdDup => "ATOM_ID_DUP",
            Self::NoEvidence => "NO_EVIDENCE",
            Self::InferredAtom => "INFERRED_ATOM",
            Self::BadSource => "BAD_SOURCE",
            Self::BadNodePath => "BAD_NODE_PATH",
            Self::BadNodePathAnchor => "BAD_NODE_PATH_ANCHOR",
            Self::BadSpan => "BAD_SPAN",
            Self::SpanOob => "SPAN_OOB",
            Self::ValidNoFp => "VALID_NO_FP",
            Self::FpMismatchValid => "FP_MISMATCH_VALID",
        }
    }
}

impl Display for IssueCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One diagnostic against an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub code: IssueCode,
    pub message: String,
    /// Pointer into the artifact, e.g. `atoms[0].evidence[1].source_id`.
    pub path: String,
}

impl Issue {
    pub fn new(code: IssueCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: path.into(),
        }
    }
}

/// Renders `- CODE: message @ path`.
impl Display for Issue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "- {}: {} @ {}", self.code, self.message, self.path)
    }
}

//! Structural validation against the KDF JSON Schema (draft 2020-12).
//!
//! The schema is compiled once by the caller and shared read-only across
//! every artifact it validates.

use crate::error::{read_json, KdfError, KdfResult};
use crate::model::issue::{Issue, IssueCode};
use jsonschema::{Draft, Validator};
use serde_json::Value;
use std::path::Path;

/// KDF v0.1 schema shipped with the crate.
pub const EMBEDDED_SCHEMA: &str = include_str!("../../schema/kdf_v0_1.schema.json");

/// Seam for schema-level checks merged into the issue list.
pub trait StructuralCheck {
    /// Returns every structural violation as a `SCHEMA` issue.
    fn check(&self, document: &Value) -> Vec<Issue>;
}

/// `jsonschema`-backed structural checker.
pub struct SchemaValidator {
    validator: Validator,
}

impl SchemaValidator {
    /// Compiles a schema document.
    ///
    /// # Errors
    /// - `KdfError::Schema` when the schema itself is invalid.
    pub fn new(schema: &Value) -> KdfResult<Self> {
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(schema)
            .map_err(|err| KdfError::Schema(err.to_string()))?;
        Ok(Self { validator })
    }

    /// Compiles the embedded KDF v0.1 schema.
    pub fn embedded() -> KdfResult<Self> {
        let schema: Value = serde_json::from_str(EMBEDDED_SCHEMA)
            .map_err(|err| KdfError::Schema(format!("embedded schema: {err}")))?;
        Self::new(&schema)
    }

    /// Reads and compiles a schema file.
    pub fn from_file(path: impl AsRef<Path>) -> KdfResult<Self> {
        let schema = read_json(path)?;
        Self::new(&schema)
    }
}

impl StructuralCheck for SchemaValidator {
    fn check(&self, document: &Value) -> Vec<Issue> {
        let mut issues = self
            .validator
            .iter_errors(document)
            .map(|err| {
                let pointer = err.instance_path.to_string();
                Issue::new(
                    IssueCode::Schema,
                    err.to_string(),
                    pointer.trim_start_matches('/'),
                )
            })
            .collect::<Vec<_>>();
        issues.sort_by(|left, right| {
            left.path
                .cmp(&right.path)
                .then_with(|| left.message.cmp(&right.message))
        });
        issues
    }
}

//! Full artifact validation: structural, decode and semantic issues merged.

use crate::config::ValidatorConfig;
use crate::error::{read_json, KdfResult};
use crate::model::artifact::{Artifact, ValidationStatus};
use crate::model::issue::Issue;
use crate::validate::evidence::EvidenceValidator;
use crate::validate::structural::StructuralCheck;
use log::info;
use serde_json::Value;
use std::path::Path;

/// Validator combining an injected structural check with the semantic rules.
pub struct ArtifactValidator<'s> {
    structural: &'s dyn StructuralCheck,
    evidence: EvidenceValidator,
}

/// Result of validating one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// Structural issues first, then decode issues, then semantic issues.
    pub issues: Vec<Issue>,
    /// Worst evidence status declared in the artifact.
    pub worst_status: ValidationStatus,
}

impl ValidationOutcome {
    /// An artifact passes iff it has no issues at all.
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }

    /// Renders `[PASS|FAIL] <label>` followed by one line per issue.
    pub fn render(&self, label: &str) -> String {
        let verdict = if self.passed() { "PASS" } else { "FAIL" };
        let mut lines = vec![format!("[{verdict}] {label}")];
        lines.extend(self.issues.iter().map(Issue::to_string));
        lines.join("\n")
    }
}

impl<'s> ArtifactValidator<'s> {
    pub fn new(structural: &'s dyn StructuralCheck, evidence: EvidenceValidator) -> Self {
        Self {
            structural,
            evidence,
        }
    }

    /// Builds the semantic half from configuration.
    ///
    /// # Errors
    /// - `KdfError::Config` when the marker list cannot be compiled.
    pub fn with_config(
        structural: &'s dyn StructuralCheck,
        config: &ValidatorConfig,
    ) -> KdfResult<Self> {
        let evidence = EvidenceValidator::new(config.markers()?, config.type_tag_policy);
        Ok(Self::new(structural, evidence))
    }

    /// Validates a parsed artifact document.
    pub fn validate_value(&self, document: &Value) -> ValidationOutcome {
        let mut issues = self.structural.check(document);
        let (artifact, decode_issues) = Artifact::decode(document);
        issues.extend(decode_issues);
        issues.extend(self.evidence.validate(&artifact));

        let outcome = ValidationOutcome {
            issues,
            worst_status: artifact.worst_status(),
        };
        info!(
            "event=validation_done module=validate status={} issues={} worst_status={}",
            if outcome.passed() { "ok" } else { "error" },
            outcome.issues.len(),
            outcome.worst_status.as_str()
        );
        outcome
    }

    /// Reads, parses and validates one artifact file.
    ///
    /// # Errors
    /// - `KdfError::Io` or `KdfError::Json` when the file is unusable.
    pub fn validate_file(&self, path: impl AsRef<Path>) -> KdfResult<ValidationOutcome> {
        let document = read_json(path)?;
        Ok(self.validate_value(&document))
    }
}

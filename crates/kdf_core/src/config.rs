//! Validator configuration.
//!
//! # Responsibility
//! - Hold the tunable, data-only parts of validation: inference markers and
//!   the node-path type-tag policy.
//! - Load overrides from an optional JSON file.
//!
//! # Invariants
//! - Missing fields fall back to built-in defaults.
//! - Unknown fields are rejected so typos do not silently disable checks.

use crate::error::{read_text, KdfError, KdfResult};
use crate::index::path::TypeTagPolicy;
use crate::validate::markers::{InferenceMarkers, DEFAULT_INFERENCE_MARKERS};
use serde::Deserialize;
use std::path::Path;

/// Serialized configuration shape.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Ordered literal words/phrases that mark an atom as inferred.
    pub inference_markers: Vec<String>,
    pub type_tag_policy: TypeTagPolicy,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            inference_markers: DEFAULT_INFERENCE_MARKERS
                .iter()
                .map(|marker| marker.to_string())
                .collect(),
            type_tag_policy: TypeTagPolicy::IdOnly,
        }
    }
}

impl ValidatorConfig {
    /// Loads configuration from a JSON file.
    ///
    /// # Errors
    /// - `KdfError::Io` when the file cannot be read.
    /// - `KdfError::Config` when the content does not match the expected shape.
    pub fn load(path: impl AsRef<Path>) -> KdfResult<Self> {
        let path = path.as_ref();
        let text = read_text(path)?;
        serde_json::from_str(text.as_str())
            .map_err(|err| KdfError::Config(format!("`{}`: {err}", path.display())))
    }

    /// Compiles the configured marker list.
    pub fn markers(&self) -> KdfResult<InferenceMarkers> {
        InferenceMarkers::new(&self.inference_markers)
    }
}

#[cfg(test)]
mod tests {
    use super::ValidatorConfig;
    use crate::error::KdfError;
    use crate::index::path::TypeTagPolicy;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kdf.json");
        std::fs::write(&path, r#"{ "type_tag_policy": "strict" }"#).unwrap();

        let config = ValidatorConfig::load(&path).unwrap();
        assert_eq!(config.type_tag_policy, TypeTagPolicy::Strict);
        assert_eq!(
            config.inference_markers,
            ValidatorConfig::default().inference_markers
        );
    }

    #[test]
    fn custom_markers_replace_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kdf.json");
        std::fs::write(&path, r#"{ "inference_markers": ["reportedly"] }"#).unwrap();

        let markers = ValidatorConfig::load(&path).unwrap().markers().unwrap();
        assert_eq!(markers.first_match("It reportedly rained"), Some("reportedly"));
        assert_eq!(markers.first_match("It probably rained"), None);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kdf.json");
        std::fs::write(&path, r#"{ "inference_marker": [] }"#).unwrap();

        let err = ValidatorConfig::load(&path).unwrap_err();
        assert!(matches!(err, KdfError::Config(_)));
    }
}

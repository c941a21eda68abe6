//! Lexical screening for inferred (non source-backed) atom phrasing.
//!
//! # Invariants
//! - Markers are matched case-insensitively on word boundaries.
//! - Marker order is preserved; the first hit wins.

use crate::error::{KdfError, KdfResult};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// Built-in hedging/inference markers.
pub const DEFAULT_INFERENCE_MARKERS: &[&str] = &[
    "implied",
    "assumed",
    "typically",
    "generally",
    "most likely",
    "probably",
    "therefore",
    "we conclude",
    "inferred",
    "likely",
    "may",
    "might",
    "could",
    "suggests",
];

static DEFAULT_MARKERS: Lazy<InferenceMarkers> = Lazy::new(|| {
    InferenceMarkers::new(DEFAULT_INFERENCE_MARKERS.iter().copied())
        .expect("valid default inference markers")
});

/// Ordered, compiled marker list.
#[derive(Debug, Clone)]
pub struct InferenceMarkers {
    patterns: Vec<(String, Regex)>,
}

impl InferenceMarkers {
    /// Compiles literal words or phrases into `\b...\b` patterns.
    ///
    /// # Errors
    /// - `KdfError::Config` when a marker is blank.
    pub fn new<I, S>(markers: I) -> KdfResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns = Vec::new();
        for marker in markers {
            let marker = marker.as_ref().trim();
            if marker.is_empty() {
                return Err(KdfError::Config(
                    "inference markers must not be blank".to_string(),
                ));
            }
            let regex = RegexBuilder::new(format!(r"\b{}\b", regex::escape(marker)).as_str())
                .case_insensitive(true)
                .build()
                .map_err(|err| KdfError::Config(format!("marker `{marker}`: {err}")))?;
            patterns.push((marker.to_string(), regex));
        }
        Ok(Self { patterns })
    }

    /// Returns the first marker found in `payload`.
    pub fn first_match(&self, payload: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(_, regex)| regex.is_match(payload))
            .map(|(marker, _)| marker.as_str())
    }

    pub fn markers(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|(marker, _)| marker.as_str())
    }
}

impl Default for InferenceMarkers {
    fn default() -> Self {
        DEFAULT_MARKERS.clone()
    }
}

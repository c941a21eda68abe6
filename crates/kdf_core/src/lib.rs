//! Core of the KDF artifact validator.
//! Every rule that decides whether an artifact is source-backed lives here;
//! the CLI only wires files and exit codes to it.

pub mod canon;
pub mod config;
pub mod conformance;
pub mod error;
pub mod index;
pub mod logging;
pub mod model;
pub mod validate;

pub use canon::{canonicalize, content_hash, digest_text, fingerprint_span, span_fingerprint};
pub use canon::{SpanDigest, SpanError, TextDigest};
pub use config::ValidatorConfig;
pub use conformance::{run_conformance, Category, ConformanceReport, Verdict};
pub use error::{KdfError, KdfResult};
pub use index::path::TypeTagPolicy;
pub use logging::{init_logging, logging_status, LogLevel};
pub use model::artifact::{Artifact, ValidationStatus};
pub use model::issue::{Issue, IssueCode};
pub use validate::evidence::EvidenceValidator;
pub use validate::markers::InferenceMarkers;
pub use validate::pipeline::{ArtifactValidator, ValidationOutcome};
pub use validate::structural::{SchemaValidator, StructuralCheck};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

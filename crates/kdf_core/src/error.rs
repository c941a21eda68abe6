//! Process-level errors.
//!
//! These abort the current command. Artifact problems are never reported
//! here; they are `Issue`s.

use crate::canon::SpanError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub type KdfResult<T> = Result<T, KdfError>;

#[derive(Debug)]
pub enum KdfError {
    /// File could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// File content is not valid JSON.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// Span arguments violate the fingerprint contract.
    Span(SpanError),
    /// Schema document could not be compiled.
    Schema(String),
    /// Validator configuration is unusable.
    Config(String),
    /// Log backend could not be started or was reconfigured.
    Logging(String),
}

impl KdfError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn json(path: impl AsRef<Path>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl Display for KdfError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read `{}`: {source}", path.display()),
            Self::Json { path, source } => {
                write!(f, "invalid JSON in `{}`: {source}", path.display())
            }
            Self::Span(err) => write!(f, "{err}"),
            Self::Schema(message) => write!(f, "invalid schema: {message}"),
            Self::Config(message) => write!(f, "invalid configuration: {message}"),
            Self::Logging(message) => write!(f, "logging unavailable: {message}"),
        }
    }
}

impl Error for KdfError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::Span(err) => Some(err),
            Self::Schema(_) | Self::Config(_) | Self::Logging(_) => None,
        }
    }
}

impl From<SpanError> for KdfError {
    fn from(value: SpanError) -> Self {
        Self::Span(value)
    }
}

/// Reads a UTF-8 file, mapping failures to `KdfError::Io`.
pub fn read_text(path: impl AsRef<Path>) -> KdfResult<String> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|err| KdfError::io(path, err))
}

/// Reads and parses a JSON file.
pub fn read_json(path: impl AsRef<Path>) -> KdfResult<serde_json::Value> {
    let path = path.as_ref();
    let text = read_text(path)?;
    serde_json::from_str(text.as_str()).map_err(|err| KdfError::json(path, err))
}

#[cfg(test)]
mod tests {
    use super::{read_json, KdfError};
    use crate::canon::SpanError;
    use std::error::Error;

    #[test]
    fn read_json_reports_path_on_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = read_json(&path).unwrap_err();
        assert!(matches!(err, KdfError::Json { .. }));
        assert!(err.to_string().contains("broken.json"));
        assert!(err.source().is_some());
    }

    #[test]
    fn read_json_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_json(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, KdfError::Io { .. }));
    }

    #[test]
    fn span_errors_convert() {
        let err: KdfError = SpanError::Empty { start: 2, end: 1 }.into();
        assert_eq!(
            err.to_string(),
            "span start must be strictly less than end (start=2, end=1)"
        );
    }
}

//! Opt-in file logging for validator runs.
//!
//! # Responsibility
//! - Start a rolling file logger once per process.
//! - Capture panics as sanitized log events.
//!
//! # Invariants
//! - Initialization never panics and is idempotent for the same settings.
//! - A second initialization with a different level or directory fails.
//! - Event messages are `event=<name> module=<module> status=<ok|error> ...`.

use crate::error::{KdfError, KdfResult};
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_BASENAME: &str = "kdf";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_LOG_FILES: usize = 5;
const PANIC_PAYLOAD_LIMIT: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

struct ActiveLogger {
    level: LogLevel,
    dir: PathBuf,
    _handle: LoggerHandle,
}

/// Supported log levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parses a level name; `warning` is accepted as `warn`.
    pub fn parse(raw: &str) -> KdfResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(KdfError::Logging(format!(
                "unsupported log level `{other}`; expected trace|debug|info|warn|error"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// `debug` in debug builds, `info` otherwise.
    pub fn build_default() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Info
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Starts file logging under `log_dir`.
///
/// # Errors
/// - `KdfError::Logging` for an unknown level, a relative or empty
///   directory, a directory that cannot be created, a backend failure, or a
///   conflicting earlier initialization.
pub fn init_logging(level: &str, log_dir: &Path) -> KdfResult<()> {
    let level = LogLevel::parse(level)?;
    let dir = checked_log_dir(log_dir)?;

    let active = ACTIVE.get_or_try_init(|| start_logger(level, dir.as_path()))?;
    if active.dir != dir {
        return Err(KdfError::Logging(format!(
            "already logging to `{}`; refusing to switch to `{}`",
            active.dir.display(),
            dir.display()
        )));
    }
    if active.level != level {
        return Err(KdfError::Logging(format!(
            "already logging at `{}`; refusing to switch to `{level}`",
            active.level
        )));
    }
    Ok(())
}

/// Active `(level, directory)`, or `None` before `init_logging`.
pub fn logging_status() -> Option<(LogLevel, PathBuf)> {
    ACTIVE.get().map(|active| (active.level, active.dir.clone()))
}

fn start_logger(level: LogLevel, dir: &Path) -> KdfResult<ActiveLogger> {
    std::fs::create_dir_all(dir).map_err(|err| {
        KdfError::Logging(format!("cannot create `{}`: {err}", dir.display()))
    })?;

    let handle = Logger::try_with_str(level.as_str())
        .map_err(|err| KdfError::Logging(format!("level `{level}`: {err}")))?
        .log_to_file(FileSpec::default().directory(dir).basename(LOG_BASENAME))
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| KdfError::Logging(format!("backend failed to start: {err}")))?;

    install_panic_hook();
    info!(
        "event=logging_started module=logging status=ok level={} log_dir={} version={}",
        level,
        dir.display(),
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        level,
        dir: dir.to_path_buf(),
        _handle: handle,
    })
}

fn checked_log_dir(log_dir: &Path) -> KdfResult<PathBuf> {
    if log_dir.as_os_str().is_empty() {
        return Err(KdfError::Logging("log directory cannot be empty".to_string()));
    }
    if !log_dir.is_absolute() {
        return Err(KdfError::Logging(format!(
            "log directory must be absolute, got `{}`",
            log_dir.display()
        )));
    }
    Ok(log_dir.to_path_buf())
}

fn install_panic_hook() {
    if PANIC_HOOK.set(()).is_err() {
        return;
    }

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map_or_else(|| "unknown".to_string(), |loc| format!("{}:{}", loc.file(), loc.line()));
        let payload = panic_info
            .payload()
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        error!(
            "event=panic module=logging status=error location={} payload={}",
            location,
            single_line(payload.as_str(), PANIC_PAYLOAD_LIMIT)
        );
        previous(panic_info);
    }));
}

/// Folds line breaks and caps the message at `limit` characters.
fn single_line(value: &str, limit: usize) -> String {
    let folded = value.replace(['\r', '\n'], " ");
    let mut out = folded.chars().take(limit).collect::<String>();
    if folded.chars().count() > limit {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{checked_log_dir, init_logging, logging_status, single_line, LogLevel};
    use crate::error::KdfError;
    use std::path::Path;

    #[test]
    fn levels_parse_case_insensitively() {
        assert_eq!(LogLevel::parse(" INFO ").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::parse("warning").unwrap(), LogLevel::Warn);
        assert!(matches!(
            LogLevel::parse("verbose"),
            Err(KdfError::Logging(_))
        ));
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let err = checked_log_dir(Path::new("logs/kdf")).unwrap_err();
        assert!(err.to_string().contains("absolute"));
        assert!(checked_log_dir(Path::new("")).is_err());
    }

    #[test]
    fn payloads_are_folded_and_capped() {
        let folded = single_line("one\ntwo\rthree", 7);
        assert_eq!(folded, "one two...");
    }

    #[test]
    fn init_is_idempotent_and_rejects_reconfiguration() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();

        init_logging("info", first.path()).unwrap();
        init_logging("INFO", first.path()).unwrap();

        let level_err = init_logging("debug", first.path()).unwrap_err();
        assert!(level_err.to_string().contains("refusing to switch"));
        let dir_err = init_logging("info", second.path()).unwrap_err();
        assert!(dir_err.to_string().contains("refusing to switch"));

        let (level, dir) = logging_status().unwrap();
        assert_eq!(level, LogLevel::Info);
        assert_eq!(dir, first.path());
    }
}

//! `kdf` command-line entry point.
//!
//! # Responsibility
//! - Map subcommands to `kdf_core` operations and print their reports.
//! - Map outcomes to exit codes: 0 pass, 2 fail, 3 unexpected error.
//!
//! # Invariants
//! - Every error, argument errors included, is printed as
//!   `[UNEXPECTED ERROR] <message>` on stderr.
//! - `--help` and `--version` exit 0.

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use kdf_core::error::read_text;
use kdf_core::{
    digest_text, fingerprint_span, init_logging, run_conformance, ArtifactValidator, KdfResult,
    LogLevel, SchemaValidator, ValidatorConfig,
};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

const EXIT_FAIL: u8 = 2;
const EXIT_UNEXPECTED: u8 = 3;

#[derive(Parser)]
#[command(name = "kdf")]
#[command(about = "KDF validator + conformance runner", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON Schema file replacing the embedded KDF v0.1 schema
    #[arg(long, global = true, value_name = "FILE")]
    schema: Option<PathBuf>,

    /// JSON validator configuration (inference markers, type-tag policy)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level used with --log-dir (trace, debug, info, warn, error)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off without it
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a single KDF artifact JSON file
    Validate {
        /// Path to KDF JSON file
        path: PathBuf,
    },

    /// Run the conformance suite
    Conformance {
        /// Conformance directory root
        #[arg(long, default_value = "conformance")]
        root: PathBuf,
    },

    /// Print the canonical content hash and length of a text file
    HashText {
        path: PathBuf,
    },

    /// Fingerprint the code-point span [start, end) of a canonicalized text file
    Fingerprint {
        path: PathBuf,
        #[arg(allow_negative_numbers = true)]
        start: i64,
        #[arg(allow_negative_numbers = true)]
        end: i64,
    },
}

/// Verdict of a successful run.
enum Verdict {
    Pass,
    Fail,
}

impl From<Verdict> for ExitCode {
    fn from(value: Verdict) -> Self {
        match value {
            Verdict::Pass => ExitCode::SUCCESS,
            Verdict::Fail => ExitCode::from(EXIT_FAIL),
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            let rendered = err.render().to_string();
            eprintln!(
                "[UNEXPECTED ERROR] {}",
                rendered.trim().trim_start_matches("error: ")
            );
            return ExitCode::from(EXIT_UNEXPECTED);
        }
    };

    match run(cli) {
        Ok(verdict) => verdict.into(),
        Err(err) => {
            eprintln!("[UNEXPECTED ERROR] {err}");
            ExitCode::from(EXIT_UNEXPECTED)
        }
    }
}

fn run(cli: Cli) -> KdfResult<Verdict> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli
            .log_level
            .clone()
            .unwrap_or_else(|| LogLevel::build_default().as_str().to_string());
        init_logging(level.as_str(), log_dir)?;
    }

    match cli.command {
        Command::Validate { ref path } => {
            let schema = load_schema(&cli)?;
            let config = load_config(&cli)?;
            let validator = ArtifactValidator::with_config(&schema, &config)?;

            let outcome = validator.validate_file(path)?;
            println!("{}", outcome.render(path.display().to_string().as_str()));
            Ok(verdict(outcome.passed()))
        }
        Command::Conformance { ref root } => {
            let schema = load_schema(&cli)?;
            let config = load_config(&cli)?;
            let validator = ArtifactValidator::with_config(&schema, &config)?;

            let report = run_conformance(root, &validator);
            println!("{report}");
            Ok(verdict(report.passed()))
        }
        Command::HashText { ref path } => {
            let digest = digest_text(read_text(path)?.as_str());
            println!("source_hash={}", digest.source_hash);
            println!("length={}", digest.length);
            Ok(Verdict::Pass)
        }
        Command::Fingerprint {
            ref path,
            start,
            end,
        } => {
            let digest = fingerprint_span(read_text(path)?.as_str(), start, end)?;
            info!(
                "event=fingerprint module=cli status=ok start={} end={}",
                start, end
            );
            println!("span_fingerprint={}", digest.fingerprint);
            println!("span_preview={}", digest.preview);
            Ok(Verdict::Pass)
        }
    }
}

fn load_schema(cli: &Cli) -> KdfResult<SchemaValidator> {
    match cli.schema.as_deref() {
        Some(path) => SchemaValidator::from_file(path),
        None => SchemaValidator::embedded(),
    }
}

fn load_config(cli: &Cli) -> KdfResult<ValidatorConfig> {
    match cli.config.as_deref() {
        Some(path) => ValidatorConfig::load(path),
        None => Ok(ValidatorConfig::default()),
    }
}

fn verdict(passed: bool) -> Verdict {
    if passed {
        Verdict::Pass
    } else {
        Verdict::Fail
    }
}

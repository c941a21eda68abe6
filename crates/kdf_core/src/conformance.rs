//! Conformance suite runner.
//!
//! # Responsibility
//! - Run the artifact validator over the `valid`, `invalid` and `edge`
//!   fixture directories under one root.
//! - Produce a typed report that renders to the suite's text format.
//!
//! # Invariants
//! - Categories run in fixed order; fixtures run in file-name order.
//! - A missing, empty or unlistable category fails the suite.
//! - One broken fixture or directory never aborts the run.
//!
//! # See also
//! - `validate::pipeline::ArtifactValidator`

use crate::error::{read_json, KdfError, KdfResult};
use crate::model::artifact::ValidationStatus;
use crate::model::issue::Issue;
use crate::validate::pipeline::ArtifactValidator;
use log::{debug, info, warn};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const SUITE_NAME: &str = "KDF Conformance Suite";

/// Fixture category, one directory each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Every fixture must validate cleanly.
    Valid,
    /// Every fixture must fail validation.
    Invalid,
    /// Every fixture must validate; it is then classified by worst status.
    Edge,
}

impl Category {
    pub const ALL: [Category; 3] = [Self::Valid, Self::Invalid, Self::Edge];

    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Edge => "edge",
        }
    }
}

/// Outcome of one fixture against its category's expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// `valid` fixture without issues.
    Passed,
    /// `valid` fixture with issues.
    ExpectedPass(Vec<Issue>),
    /// `invalid` fixture with issues.
    FailedAsExpected,
    /// `invalid` fixture without issues.
    ExpectedFail,
    /// Clean `edge` fixture and its worst evidence status.
    Classified(ValidationStatus),
    /// `edge` fixture with issues.
    EdgeRejected(Vec<Issue>),
    /// Fixture could not be read or parsed.
    Unreadable(String),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(
            self,
            Self::Passed | Self::FailedAsExpected | Self::Classified(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureOutcome {
    /// File name within the category directory.
    pub name: String,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryReport {
    pub category: Category,
    pub dir: PathBuf,
    /// Empty when the directory is missing, unlistable or holds no fixtures.
    pub fixtures: Vec<FixtureOutcome>,
    /// Why the directory could not be listed.
    pub listing_error: Option<String>,
}

impl CategoryReport {
    pub fn passed(&self) -> bool {
        self.listing_error.is_none()
            && !self.fixtures.is_empty()
            && self.fixtures.iter().all(|fixture| fixture.verdict.is_pass())
    }
}

/// Whole-suite result; `Display` renders the text report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConformanceReport {
    pub categories: Vec<CategoryReport>,
}

impl ConformanceReport {
    pub fn passed(&self) -> bool {
        self.categories.iter().all(CategoryReport::passed)
    }
}

impl Display for ConformanceReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let verdict = if self.passed() { "PASS" } else { "FAIL" };
        write!(f, "[{verdict}] {SUITE_NAME}")?;

        for section in &self.categories {
            write!(
                f,
                "\n\n== {} ==",
                section.category.dir_name().to_ascii_uppercase()
            )?;
            if let Some(reason) = &section.listing_error {
                write!(
                    f,
                    "\n(cannot list fixtures in {}: {reason})",
                    section.dir.display()
                )?;
                continue;
            }
            if section.fixtures.is_empty() {
                write!(f, "\n(no fixtures found in {})", section.dir.display())?;
                continue;
            }
            for fixture in &section.fixtures {
                write_fixture(f, fixture)?;
            }
        }
        Ok(())
    }
}

fn write_fixture(f: &mut Formatter<'_>, fixture: &FixtureOutcome) -> std::fmt::Result {
    let name = fixture.name.as_str();
    match &fixture.verdict {
        Verdict::Passed => write!(f, "\n[PASS] {name}"),
        Verdict::FailedAsExpected => write!(f, "\n[PASS] {name} (failed as expected)"),
        Verdict::ExpectedFail => write!(f, "\n[FAIL] {name} (expected FAIL)"),
        Verdict::Classified(status) => write!(f, "\n[PASS] {name} (class={})", status.as_str()),
        Verdict::Unreadable(reason) => write!(f, "\n[FAIL] {name} (unreadable: {reason})"),
        Verdict::ExpectedPass(issues) => {
            write!(f, "\n[FAIL] {name} (expected PASS)")?;
            write_issues(f, issues)
        }
        Verdict::EdgeRejected(issues) => {
            write!(f, "\n[FAIL] {name} (edge file must be structurally valid)")?;
            write_issues(f, issues)
        }
    }
}

fn write_issues(f: &mut Formatter<'_>, issues: &[Issue]) -> std::fmt::Result {
    for issue in issues {
        write!(f, "\n  {issue}")?;
    }
    Ok(())
}

/// Runs every category under `root`.
///
/// Problems with a directory or a fixture are recorded in the report; the
/// run itself cannot fail.
pub fn run_conformance(
    root: impl AsRef<Path>,
    validator: &ArtifactValidator<'_>,
) -> ConformanceReport {
    let root = root.as_ref();
    let mut categories = Vec::with_capacity(Category::ALL.len());

    for category in Category::ALL {
        let dir = root.join(category.dir_name());
        let (fixtures, listing_error) = match list_fixtures(dir.as_path()) {
            Ok(paths) => (
                paths
                    .iter()
                    .map(|path| run_fixture(category, path.as_path(), validator))
                    .collect(),
                None,
            ),
            Err(err) => {
                warn!(
                    "event=conformance_listing module=conformance status=error dir={} error={}",
                    dir.display(),
                    err
                );
                (Vec::new(), Some(unreadable_reason(&err)))
            }
        };
        categories.push(CategoryReport {
            category,
            dir,
            fixtures,
            listing_error,
        });
    }

    let report = ConformanceReport { categories };
    info!(
        "event=conformance_done module=conformance status={} root={} fixtures={}",
        if report.passed() { "ok" } else { "error" },
        root.display(),
        report
            .categories
            .iter()
            .map(|section| section.fixtures.len())
            .sum::<usize>()
    );
    report
}

/// `*.json` files directly inside `dir`, sorted by name; missing is empty.
fn list_fixtures(dir: &Path) -> KdfResult<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(dir).map_err(|err| KdfError::io(dir, err))?;

    let mut fixtures = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| KdfError::io(dir, err))?.path();
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        if is_json && path.is_file() {
            fixtures.push(path);
        }
    }
    fixtures.sort_by(|left, right| left.file_name().cmp(&right.file_name()));
    Ok(fixtures)
}

fn run_fixture(
    category: Category,
    path: &Path,
    validator: &ArtifactValidator<'_>,
) -> FixtureOutcome {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let verdict = match read_json(path) {
        Err(err) => Verdict::Unreadable(unreadable_reason(&err)),
        Ok(document) => {
            let outcome = validator.validate_value(&document);
            match (category, outcome.passed()) {
                (Category::Valid, true) => Verdict::Passed,
                (Category::Valid, false) => Verdict::ExpectedPass(outcome.issues),
                (Category::Invalid, true) => Verdict::ExpectedFail,
                (Category::Invalid, false) => Verdict::FailedAsExpected,
                (Category::Edge, true) => Verdict::Classified(outcome.worst_status),
                (Category::Edge, false) => Verdict::EdgeRejected(outcome.issues),
            }
        }
    };

    debug!(
        "event=conformance_file module=conformance status={} category={} file={}",
        if verdict.is_pass() { "ok" } else { "error" },
        category.dir_name(),
        name
    );
    FixtureOutcome { name, verdict }
}

/// Error text without the path; the report line already names the file.
fn unreadable_reason(err: &KdfError) -> String {
    match err {
        KdfError::Io { source, .. } => source.to_string(),
        KdfError::Json { source, .. } => source.to_string(),
        other => other.to_string(),
    }
}

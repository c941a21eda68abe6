use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::path::{Path, PathBuf};

fn kdf() -> Command {
    Command::cargo_bin("kdf").unwrap()
}

fn write_artifact(dir: &Path, status: &str) -> PathBuf {
    let path = dir.join("artifact.json");
    let artifact = json!({
        "sources": [{"id": "S1"}],
        "documents": [{"id": "n1", "text": "Paris is the capital."}],
        "atoms": [{
            "id": "a1",
            "payload": "Paris is the capital",
            "evidence": [{
                "source_id": "S1",
                "node_path": "doc:n1",
                "locators": {"primary": {"type": "text_offset", "start": 0, "end": 5}},
                "validation": {"status": status}
            }]
        }]
    });
    std::fs::write(&path, artifact.to_string()).unwrap();
    path
}

fn conformance_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../conformance")
}

#[test]
fn validate_passing_artifact_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_artifact(dir.path(), "needs_review");

    kdf()
        .arg("validate")
        .arg(&path)
        .assert()
        .code(0)
        .stdout(predicate::str::starts_with(format!("[PASS] {}", path.display())));
}

#[test]
fn validate_failing_artifact_lists_issues_and_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_artifact(dir.path(), "valid");

    kdf()
        .arg("validate")
        .arg(&path)
        .assert()
        .code(2)
        .stdout(predicate::str::starts_with(format!("[FAIL] {}", path.display())))
        .stdout(predicate::str::contains(
            "- VALID_NO_FP: Evidence marked valid but has no sha256 span_fingerprint anchor @ atoms[0].evidence[0].locators.anchors",
        ));
}

#[test]
fn validate_missing_file_is_unexpected_error() {
    let dir = tempfile::tempdir().unwrap();

    kdf()
        .arg("validate")
        .arg(dir.path().join("absent.json"))
        .assert()
        .code(3)
        .stderr(predicate::str::starts_with("[UNEXPECTED ERROR] cannot read"));
}

#[test]
fn validate_malformed_json_is_unexpected_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{\"sources\": [").unwrap();

    kdf()
        .arg("validate")
        .arg(&path)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("invalid JSON"));
}

#[test]
fn checked_in_conformance_suite_passes() {
    kdf()
        .arg("conformance")
        .arg("--root")
        .arg(conformance_root())
        .assert()
        .code(0)
        .stdout(predicate::str::starts_with("[PASS] KDF Conformance Suite"))
        .stdout(predicate::str::contains("== EDGE =="));
}

#[test]
fn empty_conformance_root_fails() {
    let dir = tempfile::tempdir().unwrap();

    kdf()
        .arg("conformance")
        .arg("--root")
        .arg(dir.path())
        .assert()
        .code(2)
        .stdout(predicate::str::contains("(no fixtures found in"));
}

#[test]
fn hash_text_ignores_crlf_and_bom() {
    let dir = tempfile::tempdir().unwrap();
    let unix = dir.path().join("unix.txt");
    let windows = dir.path().join("windows.txt");
    std::fs::write(&unix, "alpha\nbeta\n").unwrap();
    std::fs::write(&windows, "\u{feff}alpha\r\nbeta\r\n").unwrap();

    let first = kdf().arg("hash-text").arg(&unix).output().unwrap();
    let second = kdf().arg("hash-text").arg(&windows).output().unwrap();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
    assert!(String::from_utf8(first.stdout).unwrap().contains("length=11"));
}

#[test]
fn fingerprint_prints_digest_and_preview() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("text.txt");
    std::fs::write(&path, "Paris is the capital.").unwrap();

    kdf()
        .args(["fingerprint"])
        .arg(&path)
        .args(["0", "5"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains(
            "span_fingerprint=5dd272b4f316b776a7b8e3d0894b37e1e42be3d5d3b204b8a5836cc50597a6b1",
        ))
        .stdout(predicate::str::contains("span_preview=Paris"));
}

#[test]
fn fingerprint_rejects_negative_and_out_of_range_spans() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("text.txt");
    std::fs::write(&path, "short").unwrap();

    kdf()
        .arg("fingerprint")
        .arg(&path)
        .args(["-1", "3"])
        .assert()
        .code(3)
        .stderr(predicate::str::starts_with("[UNEXPECTED ERROR]"));

    kdf()
        .arg("fingerprint")
        .arg(&path)
        .args(["0", "9"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("exceeds"));
}

#[test]
fn argument_errors_exit_three_and_help_exits_zero() {
    kdf()
        .arg("frobnicate")
        .assert()
        .code(3)
        .stderr(predicate::str::starts_with("[UNEXPECTED ERROR]"));

    kdf()
        .arg("--help")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("conformance"));
}

#[test]
fn config_file_overrides_markers() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_artifact(dir.path(), "needs_review");
    let config = dir.path().join("kdf.json");
    std::fs::write(&config, r#"{ "inference_markers": ["capital"] }"#).unwrap();

    kdf()
        .arg("validate")
        .arg(&path)
        .arg("--config")
        .arg(&config)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("INFERRED_ATOM"));
}

#[test]
fn relative_log_dir_is_unexpected_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_artifact(dir.path(), "needs_review");

    kdf()
        .args(["--log-dir", "relative/logs", "validate"])
        .arg(&path)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("absolute"));
}

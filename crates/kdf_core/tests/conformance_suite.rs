use kdf_core::{
    run_conformance, ArtifactValidator, Category, SchemaValidator, ValidationStatus,
    ValidatorConfig, Verdict,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

fn artifact(status: &str, evidence_count: usize) -> Value {
    let evidence = json!({
        "source_id": "S1",
        "node_path": "doc:n1",
        "locators": {"primary": {"type": "text_offset", "start": 0, "end": 5}},
        "validation": {"status": status}
    });
    json!({
        "sources": [{"id": "S1"}],
        "documents": [{"id": "n1", "type": "doc", "text": "Paris is the capital."}],
        "atoms": [{
            "id": "a1",
            "payload": "Paris is the capital",
            "evidence": vec![evidence; evidence_count]
        }]
    })
}

fn write_fixture(root: &Path, category: &str, name: &str, body: &str) {
    let dir = root.join(category);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), body).unwrap();
}

fn checked_in_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../conformance")
}

#[test]
fn failing_valid_fixture_fails_the_suite_with_details() {
    let root = tempfile::tempdir().unwrap();
    write_fixture(root.path(), "valid", "broken.json", &artifact("needs_review", 0).to_string());
    write_fixture(root.path(), "invalid", "bad.json", &artifact("valid", 1).to_string());
    write_fixture(root.path(), "edge", "review.json", &artifact("needs_review", 1).to_string());

    let schema = SchemaValidator::embedded().unwrap();
    let validator = ArtifactValidator::with_config(&schema, &ValidatorConfig::default()).unwrap();
    let report = run_conformance(root.path(), &validator);

    assert!(!report.passed());
    let text = report.to_string();
    assert!(text.starts_with("[FAIL] KDF Conformance Suite"));
    assert!(text.contains(
        "[FAIL] broken.json (expected PASS)\n  - NO_EVIDENCE: Atom must contain at least one evidence entry @ atoms[0].evidence"
    ));
    assert!(text.contains("[PASS] bad.json (failed as expected)"));
    assert!(text.contains("[PASS] review.json (class=needs_review)"));
}

#[test]
fn missing_category_and_unreadable_fixture_fail_without_aborting() {
    let root = tempfile::tempdir().unwrap();
    write_fixture(root.path(), "valid", "b.json", &artifact("needs_review", 1).to_string());
    write_fixture(root.path(), "valid", "a.json", "{ truncated");
    write_fixture(root.path(), "valid", "notes.txt", "not a fixture");
    write_fixture(root.path(), "invalid", "c.json", &artifact("valid", 1).to_string());

    let schema = SchemaValidator::embedded().unwrap();
    let validator = ArtifactValidator::with_config(&schema, &ValidatorConfig::default()).unwrap();
    let report = run_conformance(root.path(), &validator);

    assert!(!report.passed());
    let valid = &report.categories[0];
    assert_eq!(valid.category, Category::Valid);
    let names: Vec<&str> = valid.fixtures.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a.json", "b.json"]);
    assert!(matches!(valid.fixtures[0].verdict, Verdict::Unreadable(_)));
    assert_eq!(valid.fixtures[1].verdict, Verdict::Passed);

    let edge = &report.categories[2];
    assert!(edge.fixtures.is_empty());
    assert!(report
        .to_string()
        .contains(&format!("(no fixtures found in {})", edge.dir.display())));
}

#[test]
fn checked_in_suite_passes() {
    let schema = SchemaValidator::embedded().unwrap();
    let validator = ArtifactValidator::with_config(&schema, &ValidatorConfig::default()).unwrap();
    let report = run_conformance(checked_in_root(), &validator);

    assert!(report.passed(), "{report}");
    let edge = &report.categories[2];
    let classes: Vec<&Verdict> = edge.fixtures.iter().map(|f| &f.verdict).collect();
    assert_eq!(
        classes,
        vec![
            &Verdict::Classified(ValidationStatus::NeedsReview),
            &Verdict::Classified(ValidationStatus::Invalid),
            &Verdict::Classified(ValidationStatus::Valid),
        ]
    );
}

#[test]
fn unlistable_category_is_reported_and_others_still_run() {
    let root = tempfile::tempdir().unwrap();
    write_fixture(root.path(), "valid", "a.json", &artifact("needs_review", 1).to_string());
    std::fs::write(root.path().join("invalid"), "a file, not a directory").unwrap();
    write_fixture(root.path(), "edge", "e.json", &artifact("invalid", 1).to_string());

    let schema = SchemaValidator::embedded().unwrap();
    let validator = ArtifactValidator::with_config(&schema, &ValidatorConfig::default()).unwrap();
    let report = run_conformance(root.path(), &validator);

    assert!(!report.passed());
    let invalid = &report.categories[1];
    assert!(invalid.listing_error.is_some());
    assert!(invalid.fixtures.is_empty());
    assert_eq!(report.categories[0].fixtures[0].verdict, Verdict::Passed);
    assert_eq!(
        report.categories[2].fixtures[0].verdict,
        Verdict::Classified(ValidationStatus::Invalid)
    );
    assert!(report.to_string().contains("(cannot list fixtures in "));
}

//! Semantic evidence rules.
//!
//! # Responsibility
//! - Cross-check every atom and evidence entry against declared sources and
//!   the document index.
//! - Recompute span fingerprints and enforce the status gating policy.
//!
//! # Invariants
//! - Checks never stop early; every applicable issue is collected.
//! - Fingerprint drift is an error only under `status == valid`; other
//!   statuses tolerate it and only log it.
//! - The artifact is never modified.

use crate::canon::{char_len, char_slice, sha256_hex};
use crate::index::document::DocumentIndex;
use crate::index::path::{PathResolver, TypeTagPolicy};
use crate::model::artifact::{
    Anchor, Artifact, Atom, DocumentNode, Evidence, PrimaryLocator, ValidationStatus,
};
use crate::model::issue::{Issue, IssueCode};
use crate::validate::markers::InferenceMarkers;
use log::{debug, info};
use std::collections::{BTreeMap, HashSet};

/// Per-artifact semantic validator.
#[derive(Debug, Clone, Default)]
pub struct EvidenceValidator {
    markers: InferenceMarkers,
    policy: TypeTagPolicy,
}

/// Well-formed, in-bounds span in code points.
#[derive(Debug, Clone, Copy)]
struct CheckedSpan {
    start: usize,
    end: usize,
}

struct ArtifactContext<'i, 'a> {
    source_ids: HashSet<&'a str>,
    resolver: PathResolver<'i, 'a>,
}

impl EvidenceValidator {
    pub fn new(markers: InferenceMarkers, policy: TypeTagPolicy) -> Self {
        Self { markers, policy }
    }

    /// Returns every semantic issue of `artifact`.
    pub fn validate(&self, artifact: &Artifact) -> Vec<Issue> {
        let mut issues = Vec::new();
        let index = DocumentIndex::build(&artifact.documents);

        self.check_duplicates(artifact, &index, &mut issues);

        let context = ArtifactContext {
            source_ids: artifact
                .sources
                .iter()
                .map(|source| source.id.as_str())
                .collect(),
            resolver: PathResolver::new(&index, self.policy),
        };
        for atom in &artifact.atoms {
            self.check_atom(atom, &context, &mut issues);
        }

        debug!(
            "event=evidence_checked module=validate atoms={} nodes={} issues={}",
            artifact.atoms.len(),
            index.len(),
            issues.len()
        );
        issues
    }

    fn check_duplicates(
        &self,
        artifact: &Artifact,
        index: &DocumentIndex<'_>,
        issues: &mut Vec<Issue>,
    ) {
        for id in duplicated(artifact.sources.iter().map(|source| source.id.as_str())) {
            issues.push(Issue::new(
                IssueCode::SourceDup,
                format!("Duplicate source.id values are not allowed (`{id}`)"),
                "sources",
            ));
        }
        for id in index.duplicate_ids() {
            issues.push(Issue::new(
                IssueCode::NodeIdDup,
                format!("Node id `{id}` is declared more than once across documents"),
                "documents",
            ));
        }
        for id in duplicated(artifact.atoms.iter().map(|atom| atom.id.as_str())) {
            issues.push(Issue::new(
                IssueCode::AtomIdDup,
                format!("Duplicate atom.id values are not allowed (`{id}`)"),
                "atoms",
            ));
        }
    }

    fn check_atom(&self, atom: &Atom, context: &ArtifactContext<'_, '_>, issues: &mut Vec<Issue>) {
        let atom_path = format!("atoms[{}]", atom.index);

        if let Some(marker) = self.markers.first_match(atom.payload.as_str()) {
            issues.push(Issue::new(
                IssueCode::InferredAtom,
                format!("Atom payload contains inferred/non-source-backed phrasing (`{marker}`)"),
                format!("{atom_path}.payload"),
            ));
        }

        if !atom.has_evidence() {
            issues.push(Issue::new(
                IssueCode::NoEvidence,
                "Atom must contain at least one evidence entry",
                format!("{atom_path}.evidence"),
            ));
            return;
        }

        for evidence in &atom.evidence {
            let evidence_path = format!("{atom_path}.evidence[{}]", evidence.index);
            check_evidence(evidence, evidence_path.as_str(), context, issues);
        }
    }
}

fn check_evidence(
    evidence: &Evidence,
    path: &str,
    context: &ArtifactContext<'_, '_>,
    issues: &mut Vec<Issue>,
) {
    let known_source = evidence
        .source_id
        .as_deref()
        .is_some_and(|id| context.source_ids.contains(id));
    if !known_source {
        issues.push(Issue::new(
            IssueCode::BadSource,
            "Evidence source_id does not exist in sources",
            format!("{path}.source_id"),
        ));
    }

    let node = evidence.declared_node_path().and_then(|raw| {
        let resolved = context.resolver.resolve_node(raw);
        if resolved.is_none() {
            issues.push(Issue::new(
                IssueCode::BadNodePath,
                "Evidence node_path not resolvable",
                format!("{path}.node_path"),
            ));
        }
        resolved
    });

    for (position, anchor) in evidence.locators.anchors.iter().enumerate() {
        if let Anchor::NodePath { path: anchor_path } = anchor {
            if anchor_path.is_empty() || !context.resolver.resolves(anchor_path) {
                issues.push(Issue::new(
                    IssueCode::BadNodePathAnchor,
                    "Evidence anchor node_path not resolvable",
                    format!("{path}.locators.anchors[{position}]"),
                ));
            }
        }
    }

    let span = check_span(evidence, node, path, issues);
    check_fingerprints(evidence, node, span, path, issues);
}

/// Reports `BAD_SPAN`/`SPAN_OOB` and returns the span when it is usable.
fn check_span(
    evidence: &Evidence,
    node: Option<&DocumentNode>,
    path: &str,
    issues: &mut Vec<Issue>,
) -> Option<CheckedSpan> {
    let Some(PrimaryLocator::TextOffset { start, end }) = &evidence.locators.primary else {
        return None;
    };
    let primary_path = format!("{path}.locators.primary");

    let coordinates = start.as_i64().zip(end.as_i64());
    let well_formed =
        matches!(coordinates, Some((start, end)) if start >= 0 && end >= 0 && start < end);
    if !well_formed {
        issues.push(Issue::new(
            IssueCode::BadSpan,
            "Invalid text_offset span (start must be < end)",
            primary_path.as_str(),
        ));
    }

    let (start, end) = coordinates?;
    let node = node?;
    let text_len = char_len(node.text());
    if end > i64::try_from(text_len).unwrap_or(i64::MAX) {
        issues.push(Issue::new(
            IssueCode::SpanOob,
            format!("Span end {end} exceeds node text length {text_len}"),
            primary_path,
        ));
        return None;
    }

    if !well_formed {
        return None;
    }
    Some(CheckedSpan {
        start: usize::try_from(start).ok()?,
        end: usize::try_from(end).ok()?,
    })
}

/// Enforces the fingerprint requirement and mismatch policy.
fn check_fingerprints(
    evidence: &Evidence,
    node: Option<&DocumentNode>,
    span: Option<CheckedSpan>,
    path: &str,
    issues: &mut Vec<Issue>,
) {
    let status = evidence.status();
    let fingerprints = evidence
        .locators
        .anchors
        .iter()
        .enumerate()
        .filter_map(|(position, anchor)| anchor.sha256_fingerprint().map(|value| (position, value)))
        .collect::<Vec<_>>();

    if status == Some(ValidationStatus::Valid) && fingerprints.is_empty() {
        issues.push(Issue::new(
            IssueCode::ValidNoFp,
            "Evidence marked valid but has no sha256 span_fingerprint anchor",
            format!("{path}.locators.anchors"),
        ));
    }

    let (Some(node), Some(span)) = (node, span) else {
        return;
    };
    let Some(slice) = char_slice(node.text(), span.start, span.end) else {
        return;
    };
    let expected = sha256_hex(slice);

    for (position, value) in fingerprints {
        if value == expected {
            continue;
        }
        if status == Some(ValidationStatus::Valid) {
            issues.push(Issue::new(
                IssueCode::FpMismatchValid,
                "Evidence marked valid but fingerprint does not match span",
                format!("{path}.locators.anchors[{position}]"),
            ));
        } else {
            info!(
                "event=fingerprint_drift module=validate status={} path={}.locators.anchors[{}] node={}",
                status.map_or("missing", ValidationStatus::as_str),
                path,
                position,
                node.id
            );
        }
    }
}

/// Ids that occur more than once, sorted.
fn duplicated<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut counts = BTreeMap::<&str, usize>::new();
    for id in ids {
        *counts.entry(id).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, _)| id)
        .collect()
}

//! Typed KDF artifact model and its JSON decoding boundary.
//!
//! # Responsibility
//! - Define sources, document trees, atoms and evidence as typed values.
//! - Decode a parsed JSON document field by field, turning shape errors into
//!   `SCHEMA` issues instead of aborting.
//!
//! # Invariants
//! - Downstream code never reads the raw `serde_json::Value`.
//! - A malformed element is reported once and omitted; its siblings, parents
//!   and the rest of its owner are still decoded.
//! - `Atom::index` and `Evidence::index` are positions in the raw arrays.
//! - A malformed anchor keeps its slot as `Anchor::Other`.

use crate::model::issue::{Issue, IssueCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Decoded artifact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Artifact {
    pub sources: Vec<Source>,
    /// Forest of document trees.
    pub documents: Vec<DocumentNode>,
    pub atoms: Vec<Atom>,
}

/// Declared source document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Source {
    pub id: String,
    /// Opaque source metadata (title, uri, hashes, ...).
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

/// One node in a document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentNode {
    /// Unique across the whole artifact, not only within one tree.
    pub id: String,
    /// Declared node kind, e.g. `section`.
    pub kind: Option<String>,
    pub text: Option<String>,
    pub children: Vec<DocumentNode>,
}

impl DocumentNode {
    /// Node text, empty when absent.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// One asserted claim.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub index: usize,
    pub id: String,
    pub payload: String,
    /// Decodable evidence entries.
    pub evidence: Vec<Evidence>,
    /// Length of the raw `evidence` array, malformed entries included.
    pub declared_evidence: usize,
}

impl Atom {
    pub fn has_evidence(&self) -> bool {
        self.declared_evidence > 0
    }
}

/// Proof entry for one atom.
#[derive(Debug, Clone, PartialEq)]
pub struct Evidence {
    pub index: usize,
    pub source_id: Option<String>,
    pub node_path: Option<String>,
    pub locators: Locators,
    pub validation: Validation,
}

impl Evidence {
    /// Declared node path; an empty string counts as not declared.
    pub fn declared_node_path(&self) -> Option<&str> {
        self.node_path.as_deref().filter(|path| !path.is_empty())
    }

    pub fn status(&self) -> Option<ValidationStatus> {
        self.validation.status
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Locators {
    pub primary: Option<PrimaryLocator>,
    pub anchors: Vec<Anchor>,
}

/// Primary locator, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrimaryLocator {
    TextOffset {
        #[serde(default)]
        start: Coordinate,
        #[serde(default)]
        end: Coordinate,
    },
    /// Locator kinds without semantic checks (page, xpath, ...).
    #[serde(other)]
    Other,
}

/// Secondary locator, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Anchor {
    NodePath {
        #[serde(default)]
        path: String,
    },
    SpanFingerprint {
        #[serde(default)]
        algo: String,
        #[serde(default)]
        value: String,
    },
    #[serde(other)]
    Other,
}

impl Anchor {
    /// Returns the digest value when this is a `sha256` span fingerprint.
    pub fn sha256_fingerprint(&self) -> Option<&str> {
        match self {
            Self::SpanFingerprint { algo, value } if algo == "sha256" => Some(value.as_str()),
            _ => None,
        }
    }
}

/// Span coordinate as written in the artifact.
///
/// Non-integer JSON values decode to `Malformed` so span checks can report
/// them as issues. Integers above `i64::MAX` saturate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Coordinate {
    Int(i64),
    #[default]
    Malformed,
}

impl Coordinate {
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(value),
            Self::Malformed => None,
        }
    }
}

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let coordinate = match (value.as_i64(), value.as_u64()) {
            (Some(signed), _) => Self::Int(signed),
            (None, Some(_)) => Self::Int(i64::MAX),
            (None, None) => Self::Malformed,
        };
        Ok(coordinate)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Validation {
    pub status: Option<ValidationStatus>,
}

/// Evidence review state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Valid,
    NeedsReview,
    Invalid,
    /// Any other status string; the schema rejects it.
    #[serde(other)]
    Unrecognized,
}

impl ValidationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::NeedsReview => "needs_review",
            Self::Invalid => "invalid",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl Artifact {
    /// Decodes a parsed JSON document into the typed model.
    ///
    /// Returns the decoded artifact together with `SCHEMA` issues for every
    /// field or element that could not be decoded.
    pub fn decode(value: &Value) -> (Self, Vec<Issue>) {
        let mut issues = Vec::new();
        let Some(root) = value.as_object() else {
            issues.push(Issue::new(
                IssueCode::Schema,
                "artifact root must be a JSON object",
                "",
            ));
            return (Self::default(), issues);
        };

        let mut artifact = Self::default();
        for (index, item) in elements(root, "sources", None, &mut issues)
            .iter()
            .enumerate()
        {
            let path = format!("sources[{index}]");
            artifact
                .sources
                .extend(decode_element::<Source>(item, path.as_str(), &mut issues));
        }
        for (index, item) in elements(root, "documents", None, &mut issues)
            .iter()
            .enumerate()
        {
            let path = format!("documents[{index}]");
            artifact
                .documents
                .extend(decode_node(item, path.as_str(), &mut issues));
        }
        for (index, item) in elements(root, "atoms", None, &mut issues)
            .iter()
            .enumerate()
        {
            let path = format!("atoms[{index}]");
            artifact
                .atoms
                .extend(decode_atom(index, item, path.as_str(), &mut issues));
        }

        (artifact, issues)
    }

    /// Most severe evidence status anywhere in the artifact.
    ///
    /// Priority is `invalid > needs_review > valid`; artifacts without any
    /// such status rank as `valid`.
    pub fn worst_status(&self) -> ValidationStatus {
        let statuses = self
            .atoms
            .iter()
            .flat_map(|atom| atom.evidence.iter())
            .filter_map(Evidence::status)
            .collect::<Vec<_>>();

        if statuses.contains(&ValidationStatus::Invalid) {
            ValidationStatus::Invalid
        } else if statuses.contains(&ValidationStatus::NeedsReview) {
            ValidationStatus::NeedsReview
        } else {
            ValidationStatus::Valid
        }
    }
}

fn decode_node(value: &Value, path: &str, issues: &mut Vec<Issue>) -> Option<DocumentNode> {
    let object = expect_object(value, path, issues)?;
    let id = required_id(object, "node", path, issues)?;
    let kind = field::<Option<String>>(object, "type", path, issues);
    let text = field::<Option<String>>(object, "text", path, issues);

    let mut children = Vec::new();
    for (index, child) in elements(object, "children", Some(path), issues)
        .iter()
        .enumerate()
    {
        let child_path = format!("{path}.children[{index}]");
        children.extend(decode_node(child, child_path.as_str(), issues));
    }

    Some(DocumentNode {
        id,
        kind,
        text,
        children,
    })
}

fn decode_atom(
    index: usize,
    value: &Value,
    path: &str,
    issues: &mut Vec<Issue>,
) -> Option<Atom> {
    let object = expect_object(value, path, issues)?;
    let id = required_id(object, "atom", path, issues)?;
    let payload = field::<String>(object, "payload", path, issues);

    let raw_evidence = elements(object, "evidence", Some(path), issues);
    let mut evidence = Vec::with_capacity(raw_evidence.len());
    for (position, entry) in raw_evidence.iter().enumerate() {
        let entry_path = format!("{path}.evidence[{position}]");
        evidence.extend(decode_evidence(position, entry, entry_path.as_str(), issues));
    }

    Some(Atom {
        index,
        id,
        payload,
        evidence,
        declared_evidence: raw_evidence.len(),
    })
}

fn decode_evidence(
    index: usize,
    value: &Value,
    path: &str,
    issues: &mut Vec<Issue>,
) -> Option<Evidence> {
    let object = expect_object(value, path, issues)?;
    let source_id = field::<Option<String>>(object, "source_id", path, issues);
    let node_path = field::<Option<String>>(object, "node_path", path, issues);

    let locators = match nested_object(object, "locators", path, issues) {
        Some(locators) => {
            let locators_path = format!("{path}.locators");
            decode_locators(locators, locators_path.as_str(), issues)
        }
        None => Locators::default(),
    };
    let validation = match nested_object(object, "validation", path, issues) {
        Some(validation) => {
            let validation_path = format!("{path}.validation");
            Validation {
                status: field(validation, "status", validation_path.as_str(), issues),
            }
        }
        None => Validation::default(),
    };

    Some(Evidence {
        index,
        source_id,
        node_path,
        locators,
        validation,
    })
}

fn decode_locators(object: &Map<String, Value>, path: &str, issues: &mut Vec<Issue>) -> Locators {
    let primary = field::<Option<PrimaryLocator>>(object, "primary", path, issues);
    let mut anchors = Vec::new();
    for (index, anchor) in elements(object, "anchors", Some(path), issues)
        .iter()
        .enumerate()
    {
        let anchor_path = format!("{path}.anchors[{index}]");
        anchors.push(
            decode_element::<Anchor>(anchor, anchor_path.as_str(), issues).unwrap_or(Anchor::Other),
        );
    }
    Locators { primary, anchors }
}

/// Joins a parent path and a key; top-level keys have no parent.
fn child_path(parent: Option<&str>, key: &str) -> String {
    match parent {
        Some(parent) => format!("{parent}.{key}"),
        None => key.to_string(),
    }
}

fn schema_issue(message: String, path: impl Into<String>, issues: &mut Vec<Issue>) {
    issues.push(Issue::new(IssueCode::Schema, message, path));
}

/// Array under `key`; missing or `null` is empty, anything else is reported.
fn elements<'v>(
    object: &'v Map<String, Value>,
    key: &str,
    parent: Option<&str>,
    issues: &mut Vec<Issue>,
) -> &'v [Value] {
    match object.get(key) {
        None | Some(Value::Null) => Default::default(),
        Some(Value::Array(items)) => items.as_slice(),
        Some(_) => {
            schema_issue(
                format!("`{key}` must be an array"),
                child_path(parent, key),
                issues,
            );
            Default::default()
        }
    }
}

fn expect_object<'v>(
    value: &'v Value,
    path: &str,
    issues: &mut Vec<Issue>,
) -> Option<&'v Map<String, Value>> {
    let object = value.as_object();
    if object.is_none() {
        schema_issue("expected a JSON object".to_string(), path, issues);
    }
    object
}

fn nested_object<'v>(
    object: &'v Map<String, Value>,
    key: &str,
    path: &str,
    issues: &mut Vec<Issue>,
) -> Option<&'v Map<String, Value>> {
    match object.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => expect_object(value, child_path(Some(path), key).as_str(), issues),
    }
}

/// String `id`; without one the whole element is dropped.
fn required_id(
    object: &Map<String, Value>,
    what: &str,
    path: &str,
    issues: &mut Vec<Issue>,
) -> Option<String> {
    let id = object.get("id").and_then(Value::as_str).map(str::to_string);
    if id.is_none() {
        schema_issue(format!("{what} `id` must be a string"), path, issues);
    }
    id
}

/// Optional field; a value of the wrong shape is reported and defaulted.
fn field<T: DeserializeOwned + Default>(
    object: &Map<String, Value>,
    key: &str,
    path: &str,
    issues: &mut Vec<Issue>,
) -> T {
    match object.get(key) {
        None | Some(Value::Null) => T::default(),
        Some(value) => T::deserialize(value).unwrap_or_else(|err| {
            schema_issue(
                format!("cannot decode `{key}`: {err}"),
                child_path(Some(path), key),
                issues,
            );
            T::default()
        }),
    }
}

fn decode_element<T: DeserializeOwned>(
    value: &Value,
    path: &str,
    issues: &mut Vec<Issue>,
) -> Option<T> {
    match T::deserialize(value) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            schema_issue(format!("cannot decode entry: {err}"), path, issues);
            None
        }
    }
}

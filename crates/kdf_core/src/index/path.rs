//! Node-path parsing and ancestor-chain resolution.
//!
//! A node path is `type:id/type:id/...`. It resolves when every id exists in
//! the document index and each segment is an ancestor (at any depth) of the
//! segment that follows it.
//!
//! Type tags are ignored under the default `TypeTagPolicy::IdOnly`.

use crate::index::document::DocumentIndex;
use crate::model::artifact::DocumentNode;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

const SEGMENT_SEPARATOR: char = '/';
const TAG_SEPARATOR: char = ':';

/// How path segment type tags are checked against node kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTagPolicy {
    /// Only ids are resolved; `section:p1` matches a paragraph `p1`.
    #[default]
    IdOnly,
    /// Each segment tag must equal the node's declared `type`.
    Strict,
}

/// One `type:id` segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathSegment<'p> {
    pub type_tag: &'p str,
    pub id: &'p str,
}

/// Parsed node path, outermost segment first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePath<'p> {
    segments: Vec<PathSegment<'p>>,
}

/// Syntax errors for node paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    Empty,
    MissingTypeSeparator(String),
}

impl Display for PathError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "node path must not be empty"),
            Self::MissingTypeSeparator(segment) => {
                write!(f, "node path segment `{segment}` has no `type:` prefix")
            }
        }
    }
}

impl Error for PathError {}

impl<'p> NodePath<'p> {
    /// Splits `raw` into segments. The id is everything after the first `:`.
    pub fn parse(raw: &'p str) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError::Empty);
        }

        let segments = raw
            .split(SEGMENT_SEPARATOR)
            .map(|segment| {
                segment
                    .split_once(TAG_SEPARATOR)
                    .map(|(type_tag, id)| PathSegment { type_tag, id })
                    .ok_or_else(|| PathError::MissingTypeSeparator(segment.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[PathSegment<'p>] {
        &self.segments
    }

    /// Innermost segment, i.e. the addressed node.
    pub fn target(&self) -> PathSegment<'p> {
        // `parse` never produces an empty segment list.
        self.segments[self.segments.len() - 1]
    }
}

/// Resolves node paths against one document index.
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'i, 'a> {
    index: &'i DocumentIndex<'a>,
    policy: TypeTagPolicy,
}

impl<'i, 'a> PathResolver<'i, 'a> {
    pub fn new(index: &'i DocumentIndex<'a>, policy: TypeTagPolicy) -> Self {
        Self { index, policy }
    }

    /// Returns whether `raw` denotes a real ancestor chain.
    pub fn resolves(&self, raw: &str) -> bool {
        self.resolve_node(raw).is_some()
    }

    /// Resolves `raw` and returns the addressed node.
    pub fn resolve_node(&self, raw: &str) -> Option<&'a DocumentNode> {
        let path = NodePath::parse(raw).ok()?;

        for segment in path.segments() {
            let node = self.index.get(segment.id)?;
            if self.policy == TypeTagPolicy::Strict
                && node.kind.as_deref() != Some(segment.type_tag)
            {
                return None;
            }
        }

        let chained = path
            .segments()
            .windows(2)
            .all(|pair| self.index.is_ancestor(pair[0].id, pair[1].id));
        if !chained {
            return None;
        }

        self.index.get(path.target().id)
    }
}

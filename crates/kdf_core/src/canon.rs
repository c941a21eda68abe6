//! Text canonicalization, content hashing and span fingerprints.
//!
//! # Responsibility
//! - Normalize raw source text into the canonical form every coordinate
//!   refers to.
//! - Produce SHA-256 hex digests for whole texts and for code-point spans.
//!
//! # Invariants
//! - `canonicalize` is idempotent.
//! - A text and its CRLF/CR/BOM variants share one `content_hash`.
//! - Span coordinates count Unicode code points, never bytes.

use sha2::{Digest, Sha256};
use std::error::Error;
use std::fmt::{Display, Formatter};

const BOM: char = '\u{feff}';
const PREVIEW_MAX_CHARS: usize = 80;
const PREVIEW_ELLIPSIS: &str = "...";

/// Span contract violation raised by fingerprint helpers.
///
/// This is an input error of the caller, not an artifact diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanError {
    /// `start` or `end` is below zero.
    Negative { start: i64, end: i64 },
    /// `start >= end`.
    Empty { start: i64, end: i64 },
    /// `end` is past the last code point.
    OutOfBounds { end: i64, len: usize },
}

impl Display for SpanError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Negative { start, end } => write!(
                f,
                "span coordinates must be non-negative (start={start}, end={end})"
            ),
            Self::Empty { start, end } => write!(
                f,
                "span start must be strictly less than end (start={start}, end={end})"
            ),
            Self::OutOfBounds { end, len } => {
                write!(f, "span end {end} exceeds text length {len}")
            }
        }
    }
}

impl Error for SpanError {}

/// Whole-text digest printed by `hash-text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDigest {
    /// SHA-256 hex of the canonical text.
    pub source_hash: String,
    /// Code-point length of the canonical text.
    pub length: usize,
}

/// Span digest printed by `fingerprint`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanDigest {
    pub fingerprint: String,
    /// Newline-escaped, length-capped excerpt of the span.
    pub preview: String,
}

/// Strips one leading BOM and unifies line endings to `\n`.
pub fn canonicalize(raw: &str) -> String {
    let without_bom = raw.strip_prefix(BOM).unwrap_or(raw);
    without_bom.replace("\r\n", "\n").replace('\r', "\n")
}

/// SHA-256 hex digest of the canonical form of `raw`.
pub fn content_hash(raw: &str) -> String {
    sha256_hex(canonicalize(raw).as_str())
}

/// SHA-256 hex digest of `text[start..end]` in code points.
///
/// `text` must already be the text the coordinates were produced against;
/// no canonicalization happens here.
///
/// # Errors
/// - `SpanError::Negative` when either coordinate is below zero.
/// - `SpanError::Empty` when `start >= end`.
/// - `SpanError::OutOfBounds` when `end` exceeds the code-point length.
pub fn span_fingerprint(text: &str, start: i64, end: i64) -> Result<String, SpanError> {
    let span = checked_span(text, start, end)?;
    Ok(sha256_hex(span))
}

/// Number of Unicode code points in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Borrows the code-point range `[start, end)` of `text`.
///
/// Returns `None` when the range is reversed or past the end.
pub fn char_slice(text: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return None;
    }
    let byte_start = byte_offset(text, start)?;
    let byte_end = byte_offset(text, end)?;
    text.get(byte_start..byte_end)
}

/// Canonicalizes `raw` and reports its hash and code-point length.
pub fn digest_text(raw: &str) -> TextDigest {
    let canonical = canonicalize(raw);
    TextDigest {
        source_hash: sha256_hex(canonical.as_str()),
        length: char_len(canonical.as_str()),
    }
}

/// Canonicalizes `raw`, then fingerprints `[start, end)` of the canonical text.
pub fn fingerprint_span(raw: &str, start: i64, end: i64) -> Result<SpanDigest, SpanError> {
    let canonical = canonicalize(raw);
    let span = checked_span(canonical.as_str(), start, end)?;
    Ok(SpanDigest {
        fingerprint: sha256_hex(span),
        preview: preview(span),
    })
}

pub(crate) fn sha256_hex(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

fn checked_span(text: &str, start: i64, end: i64) -> Result<&str, SpanError> {
    if start < 0 || end < 0 {
        return Err(SpanError::Negative { start, end });
    }
    if start >= end {
        return Err(SpanError::Empty { start, end });
    }
    let len = char_len(text);
    let (start, end) = match (usize::try_from(start), usize::try_from(end)) {
        (Ok(start), Ok(end)) if end <= len => (start, end),
        _ => return Err(SpanError::OutOfBounds { end, len }),
    };
    char_slice(text, start, end).ok_or(SpanError::OutOfBounds {
        end: end as i64,
        len,
    })
}

fn byte_offset(text: &str, char_index: usize) -> Option<usize> {
    if char_index == 0 {
        return Some(0);
    }
    match text.char_indices().nth(char_index) {
        Some((offset, _)) => Some(offset),
        None if char_len(text) == char_index => Some(text.len()),
        None => None,
    }
}

fn preview(span: &str) -> String {
    let escaped = span.replace('\n', "\\n");
    if char_len(escaped.as_str()) <= PREVIEW_MAX_CHARS {
        return escaped;
    }
    let keep = PREVIEW_MAX_CHARS - PREVIEW_ELLIPSIS.len();
    let mut truncated = escaped.chars().take(keep).collect::<String>();
    truncated.push_str(PREVIEW_ELLIPSIS);
    truncated
}

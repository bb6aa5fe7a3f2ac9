//! Dot-separated attribute paths naming association hops.
//!
//! A path such as `addresses.user` starts at a root entity and names one
//! association per segment. This module only checks syntax; whether each hop
//! exists is decided by the fetch plan builder against the association
//! registry.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

/// Separator between path segments.
pub const SEGMENT_SEPARATOR: char = '.';
/// Separator between paths in the `attributes` query parameter.
pub const LIST_SEPARATOR: char = ',';

static SEGMENT_RE: OnceLock<Regex> = OnceLock::new();

fn segment_regex() -> &'static Regex {
    SEGMENT_RE.get_or_init(|| {
        Regex::new("^[A-Za-z_][A-Za-z0-9_]*$")
            .unwrap_or_else(|error| panic!("attribute segment regex failed to compile: {error}"))
    })
}

/// Syntax errors raised while parsing attribute paths.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttributePathError {
    #[error("attribute path must not be empty")]
    Empty,
    #[error("attribute path '{path}' contains an empty segment")]
    EmptySegment { path: String },
    #[error("attribute path '{path}' contains invalid segment '{segment}'")]
    InvalidSegment { path: String, segment: String },
}

/// Validated attribute path.
///
/// ## Invariants
/// - At least one segment.
/// - Every segment matches `[A-Za-z_][A-Za-z0-9_]*`.
///
/// # Examples
/// ```
/// use user_service::domain::AttributePath;
///
/// let path = AttributePath::parse("addresses.user").expect("valid path");
/// assert_eq!(path.segments().collect::<Vec<_>>(), ["addresses", "user"]);
/// assert_eq!(path.parent().map(|p| p.to_string()), Some("addresses".to_owned()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttributePath(String);

impl AttributePath {
    /// Parse a single path, trimming surrounding whitespace.
    pub fn parse(raw: &str) -> Result<Self, AttributePathError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AttributePathError::Empty);
        }
        for segment in trimmed.split(SEGMENT_SEPARATOR) {
            if segment.is_empty() {
                return Err(AttributePathError::EmptySegment {
                    path: trimmed.to_owned(),
                });
            }
            if !segment_regex().is_match(segment) {
                return Err(AttributePathError::InvalidSegment {
                    path: trimmed.to_owned(),
                    segment: segment.to_owned(),
                });
            }
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Segments from the root outwards.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEGMENT_SEPARATOR)
    }

    /// Number of association hops.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Path without its last segment, or `None` for single-segment paths.
    pub fn parent(&self) -> Option<Self> {
        self.0
            .rsplit_once(SEGMENT_SEPARATOR)
            .map(|(head, _)| Self(head.to_owned()))
    }

    /// Borrow the dotted form.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AttributePath {
    type Err = AttributePathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for AttributePath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Parse the comma-separated `attributes` parameter.
///
/// Items are trimmed and blank items are skipped, so an absent or all-blank
/// value yields no paths. Duplicates are removed while first-seen order is
/// preserved.
///
/// # Examples
/// ```
/// use user_service::domain::parse_attribute_list;
///
/// let paths = parse_attribute_list(Some(" addresses, ,contacts,addresses")).expect("valid");
/// let names: Vec<_> = paths.iter().map(|p| p.as_str()).collect();
/// assert_eq!(names, ["addresses", "contacts"]);
/// assert!(parse_attribute_list(None).expect("absent").is_empty());
/// ```
pub fn parse_attribute_list(raw: Option<&str>) -> Result<Vec<AttributePath>, AttributePathError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    let mut paths: Vec<AttributePath> = Vec::new();
    for item in raw.split(LIST_SEPARATOR).map(str::trim) {
        if item.is_empty() {
            continue;
        }
        let path = AttributePath::parse(item)?;
        if !paths.contains(&path) {
            paths.push(path);
        }
    }
    Ok(paths)
}

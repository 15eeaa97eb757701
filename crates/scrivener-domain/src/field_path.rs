//! Field path grammar
//!
//! A field path addresses a value inside a document:
//!
//! ```text
//! path    := segment ('.' segment)*
//! segment := name | name '[' ']' | name '[' digits ']'
//! ```
//!
//! Catalog paths are type-level and only ever use the empty `[]` form
//! (`modules[].quoteModule.author`). Generated value maps may address a
//! concrete item with an explicit index (`modules[3].quoteModule.author`).
//! Parsing and formatting live here so that index capture and matching are
//! defined exactly once.

use std::fmt;
use thiserror::Error;

/// Errors produced while parsing a field path
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path string was empty
    #[error("Field path is empty")]
    Empty,

    /// A segment had no property name (`a..b`, `.a`, `[]`)
    #[error("Empty segment at position {0} in '{1}'")]
    EmptySegment(usize, String),

    /// Brackets were unbalanced or contained something other than digits
    #[error("Malformed array segment '{0}'")]
    MalformedArray(String),
}

/// One segment of a field path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Plain property access: `title`
    Property(String),

    /// Array access: `modules[]` or `modules[2]`
    Array {
        /// Property holding the array
        name: String,
        /// Explicit item index, only present in generated value maps
        index: Option<usize>,
    },
}

impl Segment {
    /// Property name of the segment, without any bracket suffix
    pub fn name(&self) -> &str {
        match self {
            Segment::Property(name) => name,
            Segment::Array { name, .. } => name,
        }
    }

    /// Whether this segment addresses an array
    pub fn is_array(&self) -> bool {
        matches!(self, Segment::Array { .. })
    }

    fn parse(raw: &str, position: usize, whole: &str) -> Result<Self, PathError> {
        let Some(open) = raw.find('[') else {
            if raw.is_empty() {
                return Err(PathError::EmptySegment(position, whole.to_string()));
            }
            if raw.contains(']') {
                return Err(PathError::MalformedArray(raw.to_string()));
            }
            return Ok(Segment::Property(raw.to_string()));
        };

        let name = &raw[..open];
        if name.is_empty() {
            return Err(PathError::EmptySegment(position, whole.to_string()));
        }
        let inner = raw[open + 1..]
            .strip_suffix(']')
            .ok_or_else(|| PathError::MalformedArray(raw.to_string()))?;

        let index = if inner.is_empty() {
            None
        } else if inner.bytes().all(|b| b.is_ascii_digit()) {
            Some(
                inner
                    .parse::<usize>()
                    .map_err(|_| PathError::MalformedArray(raw.to_string()))?,
            )
        } else {
            return Err(PathError::MalformedArray(raw.to_string()));
        };

        Ok(Segment::Array {
            name: name.to_string(),
            index,
        })
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Property(name) => write!(f, "{}", name),
            Segment::Array { name, index: None } => write!(f, "{}[]", name),
            Segment::Array {
                name,
                index: Some(i),
            } => write!(f, "{}[{}]", name, i),
        }
    }
}

/// A parsed field path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// Parse a field path from its string form
    ///
    /// # Examples
    ///
    /// ```
    /// use scrivener_domain::FieldPath;
    ///
    /// let path = FieldPath::parse("modules[2].quoteModule.author").unwrap();
    /// assert_eq!(path.len(), 3);
    /// assert_eq!(path.leaf(), "author");
    /// assert_eq!(path.first_index(), Some(2));
    /// ```
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError::Empty);
        }
        let segments = raw
            .split('.')
            .enumerate()
            .map(|(i, part)| Segment::parse(part, i, raw))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    /// Single-property root path
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Property(name.into())],
        }
    }

    /// Build a path from already-validated segments
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Path with `.name` appended
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Property(name.into()));
        Self { segments }
    }

    /// Path with the last segment turned into a type-level array segment
    pub fn into_array(mut self) -> Self {
        if let Some(last) = self.segments.pop() {
            self.segments.push(Segment::Array {
                name: last.name().to_string(),
                index: None,
            });
        }
        self
    }

    /// All segments in order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false for a parsed path; provided for API symmetry
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Property name of the last segment
    pub fn leaf(&self) -> &str {
        self.segments.last().map(Segment::name).unwrap_or_default()
    }

    /// Whether any segment addresses an array
    pub fn has_array(&self) -> bool {
        self.segments.iter().any(Segment::is_array)
    }

    /// Index of the first explicitly-indexed array segment, if any
    pub fn first_index(&self) -> Option<usize> {
        self.segments.iter().find_map(|s| match s {
            Segment::Array { index, .. } => *index,
            Segment::Property(_) => None,
        })
    }

    /// The same path with every explicit index erased (`a[3].b` → `a[].b`)
    pub fn type_level(&self) -> Self {
        Self {
            segments: self
                .segments
                .iter()
                .map(|s| match s {
                    Segment::Array { name, .. } => Segment::Array {
                        name: name.clone(),
                        index: None,
                    },
                    other => other.clone(),
                })
                .collect(),
        }
    }

    /// Segments following the first array segment
    ///
    /// For `modules[].quoteModule.author` this is `quoteModule.author`.
    pub fn after_array(&self) -> &[Segment] {
        match self.segments.iter().position(Segment::is_array) {
            Some(pos) => &self.segments[pos + 1..],
            None => &[],
        }
    }

    /// Match a concrete (possibly indexed) path against this type-level path
    ///
    /// Every array segment of `self` accepts `[]` or `[n]` in the candidate;
    /// every other segment must match literally. On success the first captured
    /// index is returned (`Some(None)` when the candidate carried no index).
    ///
    /// # Examples
    ///
    /// ```
    /// use scrivener_domain::FieldPath;
    ///
    /// let pattern = FieldPath::parse("modules[].quoteModule.author").unwrap();
    /// let hit = FieldPath::parse("modules[4].quoteModule.author").unwrap();
    /// let bare = FieldPath::parse("modules[].quoteModule.author").unwrap();
    /// let miss = FieldPath::parse("modules[4].heroModule.author").unwrap();
    ///
    /// assert_eq!(pattern.match_instance(&hit), Some(Some(4)));
    /// assert_eq!(pattern.match_instance(&bare), Some(None));
    /// assert_eq!(pattern.match_instance(&miss), None);
    /// ```
    pub fn match_instance(&self, candidate: &FieldPath) -> Option<Option<usize>> {
        if self.segments.len() != candidate.segments.len() {
            return None;
        }
        let mut captured = None;
        for (expected, actual) in self.segments.iter().zip(&candidate.segments) {
            match (expected, actual) {
                (Segment::Property(a), Segment::Property(b)) if a == b => {}
                (Segment::Array { name: a, .. }, Segment::Array { name: b, index }) if a == b => {
                    if captured.is_none() {
                        captured = *index;
                    }
                }
                _ => return None,
            }
        }
        Some(captured)
    }

    /// Whether `raw` addresses this path or something beneath it
    ///
    /// Used for presence checks: `seo.title` and `modules[0].x` both count as
    /// addressing beneath `seo` and `modules` respectively.
    pub fn is_addressed_by(&self, raw: &str) -> bool {
        let own = self.to_string();
        match raw.strip_prefix(own.as_str()) {
            Some("") => true,
            Some(rest) => rest.starts_with('.') || rest.starts_with('['),
            None => false,
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

//! Query path type definitions and parsing.
//!
//! A query path selects model nodes by their identity and the identities of
//! their ancestors:
//!
//! ```text
//! path    := ["~"] ["/"] segment ("/" segment)*
//! segment := term (whitespace term)* | ".."
//! term    := "*" | "#" tag | "." tag | name
//! ```
//!
//! `..` segments may only lead a relative path. They are consumed by
//! [`TreeQueryExt::query_parent_or_children`](crate::TreeQueryExt::query_parent_or_children),
//! which climbs one parent per `..` before querying.

use std::fmt;
use std::str::FromStr;

use crate::error::{QueryError, Result};

/// A single term of a segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// Bare literal, compared with the node name.
    Name(String),
    /// `#tag`, membership in the logical ids.
    Logical(String),
    /// `.tag`, membership in the styling ids.
    Styling(String),
    /// `*`, matches any node.
    Any,
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Name(name) => f.write_str(name),
            Term::Logical(tag) => write!(f, "#{tag}"),
            Term::Styling(tag) => write!(f, ".{tag}"),
            Term::Any => f.write_str("*"),
        }
    }
}

/// One `/`-separated segment: the conjunction of its terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Segment {
    /// Terms that must all hold.
    pub terms: Vec<Term>,
}

impl Segment {
    /// Create an empty segment.
    pub fn new() -> Self {
        Self::default()
    }

    /// A segment matching any node.
    pub fn any() -> Self {
        Self {
            terms: vec![Term::Any],
        }
    }

    /// A segment matching a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            terms: vec![Term::Name(name.into())],
        }
    }

    /// Add a name term.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.terms.push(Term::Name(name.into()));
        self
    }

    /// Add a logical id term.
    pub fn with_logical(mut self, tag: impl Into<String>) -> Self {
        self.terms.push(Term::Logical(tag.into()));
        self
    }

    /// Add a styling id term.
    pub fn with_styling(mut self, tag: impl Into<String>) -> Self {
        self.terms.push(Term::Styling(tag.into()));
        self
    }

    /// Number of logical id terms.
    pub fn logical_count(&self) -> u32 {
        self.terms.iter().filter(|t| matches!(t, Term::Logical(_))).count() as u32
    }

    /// Number of styling id terms.
    pub fn styling_count(&self) -> u32 {
        self.terms.iter().filter(|t| matches!(t, Term::Styling(_))).count() as u32
    }

    /// Check if the segment names the node explicitly.
    pub fn is_named(&self) -> bool {
        self.terms.iter().any(|t| matches!(t, Term::Name(_)))
    }

    /// Check if the segment places no constraint on a node.
    pub fn is_wildcard(&self) -> bool {
        self.terms.iter().all(|t| matches!(t, Term::Any))
    }

    fn parse(raw: &str, source: &str) -> Result<Self> {
        let mut terms = Vec::new();
        for token in raw.split_whitespace() {
            let term = if token == "*" {
                Term::Any
            } else if token == ".." {
                return Err(QueryError::MisplacedParent {
                    path: source.to_string(),
                });
            } else if let Some(tag) = token.strip_prefix('#') {
                Term::Logical(non_empty(tag, source)?)
            } else if let Some(tag) = token.strip_prefix('.') {
                Term::Styling(non_empty(tag, source)?)
            } else {
                Term::Name(token.to_string())
            };
            terms.push(term);
        }
        if terms.is_empty() {
            return Err(QueryError::EmptySegment {
                path: source.to_string(),
            });
        }
        Ok(Self { terms })
    }
}

fn non_empty(tag: &str, source: &str) -> Result<String> {
    if tag.is_empty() {
        Err(QueryError::EmptyTerm {
            path: source.to_string(),
        })
    } else {
        Ok(tag.to_string())
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{term}")?;
        }
        Ok(())
    }
}

/// A parsed query path.
///
/// Build one with [`QueryPath::parse`] (strict) or
/// [`QueryPath::parse_lenient`] (a malformed path becomes a path that
/// matches nothing).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryPath {
    source: String,
    negated: bool,
    rooted: bool,
    up_levels: usize,
    segments: Vec<Segment>,
    valid: bool,
}

impl QueryPath {
    /// Parse a query path, rejecting malformed syntax.
    pub fn parse(source: &str) -> Result<Self> {
        let mut rest = source.trim();
        if rest.is_empty() {
            return Err(QueryError::Empty);
        }

        let negated = match rest.strip_prefix('~') {
            Some(stripped) => {
                rest = stripped.trim_start();
                true
            }
            None => false,
        };
        let rooted = match rest.strip_prefix('/') {
            Some(stripped) => {
                rest = stripped;
                true
            }
            None => false,
        };
        if rest.trim().is_empty() {
            return Err(QueryError::Empty);
        }

        let mut up_levels = 0;
        let mut segments = Vec::new();
        for raw in rest.split('/') {
            let raw = raw.trim();
            if raw == ".." {
                if rooted || !segments.is_empty() {
                    return Err(QueryError::MisplacedParent {
                        path: source.to_string(),
                    });
                }
                up_levels += 1;
                continue;
            }
            segments.push(Segment::parse(raw, source)?);
        }

        tracing::trace!(target: "trellis_query", path = source, segments = segments.len(), up_levels, "parsed query path");

        Ok(Self {
            source: source.to_string(),
            negated,
            rooted,
            up_levels,
            segments,
            valid: true,
        })
    }

    /// Parse a query path, turning malformed syntax into a path that matches
    /// nothing.
    pub fn parse_lenient(source: &str) -> Self {
        Self::parse(source).unwrap_or_else(|error| {
            tracing::warn!(target: "trellis_query", path = source, %error, "malformed query path matches nothing");
            Self::invalid(source)
        })
    }

    /// A path that matches nothing.
    pub fn invalid(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            negated: false,
            rooted: false,
            up_levels: 0,
            segments: Vec::new(),
            valid: false,
        }
    }

    /// Build a path from segments.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        let mut path = Self {
            source: String::new(),
            negated: false,
            rooted: false,
            up_levels: 0,
            valid: !segments.is_empty(),
            segments,
        };
        path.source = path.render();
        path
    }

    /// A path matching any node.
    pub fn any() -> Self {
        Self::from_segments(vec![Segment::any()])
    }

    /// Anchor the path to the tree root.
    pub fn rooted(mut self) -> Self {
        self.rooted = true;
        self.source = self.render();
        self
    }

    /// Negate the path.
    pub fn negated(mut self) -> Self {
        self.negated = true;
        self.source = self.render();
        self
    }

    fn render(&self) -> String {
        let mut out = String::new();
        if self.negated {
            out.push('~');
        }
        if self.rooted {
            out.push('/');
        }
        let parts: Vec<String> = std::iter::repeat_n("..".to_string(), self.up_levels)
            .chain(self.segments.iter().map(ToString::to_string))
            .collect();
        out.push_str(&parts.join("/"));
        out
    }

    /// The text the path was built from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Check if the path starts with `~`.
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Check if the path starts with `/`.
    pub fn is_rooted(&self) -> bool {
        self.rooted
    }

    /// Check if the path parsed successfully.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Number of leading `..` segments.
    pub fn up_levels(&self) -> usize {
        self.up_levels
    }

    /// The regular segments, root-most first.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The segment the node itself must satisfy.
    pub fn subject(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Split off the leading `..` prefix.
    ///
    /// Returns the number of parent steps and the remaining path, or `None`
    /// as the remainder when the path consisted of `..` segments only.
    pub fn split_parent_prefix(&self) -> (usize, Option<QueryPath>) {
        if self.up_levels == 0 {
            return (0, Some(self.clone()));
        }
        let rest = (!self.segments.is_empty()).then(|| {
            let mut rest = Self::from_segments(self.segments.clone());
            rest.valid = self.valid;
            if self.negated {
                rest = rest.negated();
            }
            rest
        });
        (self.up_levels, rest)
    }
}

impl FromStr for QueryPath {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for QueryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

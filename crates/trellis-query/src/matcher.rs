//! Query path matching algorithm.

use trellis_core::NodeRef;

use crate::path::{QueryPath, Segment, Term};
use crate::priority::QueryPriority;

/// Identity and ancestry of a node, as seen by the matcher.
pub trait NodeIdentity: Sized {
    /// The node name.
    fn name(&self) -> &str;

    /// Check logical id membership.
    fn has_logical_id(&self, tag: &str) -> bool;

    /// Check styling id membership.
    fn has_styling_id(&self, tag: &str) -> bool;

    /// The parent node, if any.
    fn parent_identity(&self) -> Option<Self>;
}

impl NodeIdentity for NodeRef<'_> {
    fn name(&self) -> &str {
        NodeRef::name(self)
    }

    fn has_logical_id(&self, tag: &str) -> bool {
        NodeRef::has_logical_id(self, tag)
    }

    fn has_styling_id(&self, tag: &str) -> bool {
        NodeRef::has_styling_id(self, tag)
    }

    fn parent_identity(&self) -> Option<Self> {
        self.parent()
    }
}

/// Query matching engine.
pub struct QueryMatcher;

impl QueryMatcher {
    /// Check if every term of a segment holds for the node.
    pub fn segment_matches<N: NodeIdentity>(segment: &Segment, node: &N) -> bool {
        segment.terms.iter().all(|term| match term {
            Term::Any => true,
            Term::Name(name) => node.name() == name,
            Term::Logical(tag) => node.has_logical_id(tag),
            Term::Styling(tag) => node.has_styling_id(tag),
        })
    }

    /// Check if a path matches the node.
    ///
    /// Invalid paths and paths still carrying a `..` prefix match nothing,
    /// negated or not.
    pub fn matches<N: NodeIdentity>(path: &QueryPath, node: &N) -> bool {
        if !Self::is_absolute(path) {
            return false;
        }
        Self::matches_unnegated(path, node) != path.is_negated()
    }

    /// Compute the priority of a path against the node.
    ///
    /// Returns `None` if the path does not match. A negated path that matches
    /// has the lowest priority.
    pub fn priority<N: NodeIdentity>(path: &QueryPath, node: &N) -> Option<QueryPriority> {
        if !Self::matches(path, node) {
            return None;
        }
        Some(if path.is_negated() {
            QueryPriority::default()
        } else {
            QueryPriority::of_path(path)
        })
    }

    fn is_absolute(path: &QueryPath) -> bool {
        path.is_valid() && path.up_levels() == 0 && !path.segments().is_empty()
    }

    fn matches_unnegated<N: NodeIdentity>(path: &QueryPath, node: &N) -> bool {
        let Some((subject, rest)) = path.segments().split_last() else {
            return false;
        };
        if !Self::segment_matches(subject, node) {
            return false;
        }

        let mut ancestor = node.parent_identity();
        if path.is_rooted() {
            // Position by position, ending exactly at the root.
            for segment in rest.iter().rev() {
                match ancestor {
                    Some(current) if Self::segment_matches(segment, &current) => {
                        ancestor = current.parent_identity();
                    }
                    _ => return false,
                }
            }
            return ancestor.is_none();
        }

        // Each segment consumes the nearest ancestor satisfying it.
        for segment in rest.iter().rev() {
            loop {
                let Some(current) = ancestor else {
                    return false;
                };
                ancestor = current.parent_identity();
                if Self::segment_matches(segment, &current) {
                    break;
                }
            }
        }
        true
    }
}

//! Query priority (specificity) calculation.

use std::cmp::Ordering;
use std::fmt;

use crate::path::{QueryPath, Segment};

/// Specificity contributed by one segment.
///
/// Fields compare in declaration order: logical id count first, then styling
/// id count, then whether the segment names the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SegmentPriority {
    /// Number of `#tag` terms.
    pub logical: u32,
    /// Number of `.tag` terms.
    pub styling: u32,
    /// Whether a literal name term is present.
    pub named: bool,
}

impl SegmentPriority {
    /// Zero specificity (a `*` segment).
    pub const ZERO: Self = Self {
        logical: 0,
        styling: 0,
        named: false,
    };

    /// Calculate the specificity of a segment.
    pub fn of_segment(segment: &Segment) -> Self {
        Self {
            logical: segment.logical_count(),
            styling: segment.styling_count(),
            named: segment.is_named(),
        }
    }
}

/// Specificity of a matched query path.
///
/// Index 0 holds the node's own segment, followed by each preceding segment
/// from the nearest ancestor to the farthest. Two priorities compare
/// lexicographically by index; a missing index counts as
/// [`SegmentPriority::ZERO`], so `apple` and `*/apple` are equal.
#[derive(Debug, Clone, Default)]
pub struct QueryPriority(Vec<SegmentPriority>);

impl QueryPriority {
    /// Calculate the specificity of a path's segments.
    ///
    /// This does not check that the path matches anything; use
    /// [`QueryMatcher::priority`](crate::QueryMatcher::priority) for that.
    pub fn of_path(path: &QueryPath) -> Self {
        Self(
            path.segments()
                .iter()
                .rev()
                .map(SegmentPriority::of_segment)
                .collect(),
        )
    }

    /// Per-segment priorities, the node's own segment first.
    pub fn segments(&self) -> &[SegmentPriority] {
        &self.0
    }

    fn at(&self, index: usize) -> SegmentPriority {
        self.0.get(index).copied().unwrap_or(SegmentPriority::ZERO)
    }
}

impl From<Vec<SegmentPriority>> for QueryPriority {
    fn from(segments: Vec<SegmentPriority>) -> Self {
        Self(segments)
    }
}

impl Ord for QueryPriority {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        (0..len)
            .map(|i| self.at(i).cmp(&other.at(i)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for QueryPriority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueryPriority {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueryPriority {}

impl fmt::Display for QueryPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, s) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "({},{},{})", s.logical, s.styling, u8::from(s.named))?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn priority(path: &str) -> QueryPriority {
        QueryPriority::of_path(&QueryPath::parse(path).unwrap())
    }

    #[test]
    fn segment_priority_calculation() {
        let p = priority("apple #a #b .c");
        assert_eq!(
            p.segments(),
            &[SegmentPriority {
                logical: 2,
                styling: 1,
                named: true,
            }]
        );
        assert_eq!(priority("*").segments(), &[SegmentPriority::ZERO]);
    }

    #[test]
    fn logical_outranks_styling_outranks_name() {
        assert!(priority("#a") > priority(".a .b .c"));
        assert!(priority(".a") > priority("apple"));
        assert!(priority("apple") > priority("*"));
    }

    #[test]
    fn own_segment_outranks_ancestors() {
        assert!(priority("apple #x") > priority("#y #z/apple"));
        assert!(priority("#y/apple") > priority("apple"));
    }

    #[test]
    fn padding_makes_wildcards_equal() {
        assert_eq!(priority("apple"), priority("*/apple"));
        assert_eq!(priority("apple"), priority("*/*/apple"));
        assert_eq!(priority("apple .a"), priority("apple .b"));
    }

    #[test]
    fn display_format() {
        assert_eq!(priority("root/apple #x").to_string(), "[(1,0,1) (0,0,1)]");
    }
}

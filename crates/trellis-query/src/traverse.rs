//! Lazy tree queries.
//!
//! Queries walk a subtree depth-first, parent before children, and yield
//! every node the path matches. They are plain iterators: finite, lazy, and
//! consumed once.
//!
//! ```
//! use trellis_core::ModelTree;
//! use trellis_query::TreeQueryExt;
//!
//! let mut tree = ModelTree::new();
//! let root = tree.create_node("root");
//! let a = tree.create_node("apple");
//! let b = tree.create_node("pear");
//! tree.add_children(root, [a, b]).unwrap();
//!
//! assert_eq!(tree.query(root, "apple").collect::<Vec<_>>(), vec![a]);
//! assert_eq!(tree.query(root, "*").count(), 3);
//! assert_eq!(tree.query_children(root, "*").count(), 2);
//! ```

use trellis_core::{ModelTree, NodeId};

use crate::matcher::QueryMatcher;
use crate::path::QueryPath;
use crate::priority::QueryPriority;

/// A lazy, depth-first query over a subtree.
#[derive(Debug)]
pub struct Query<'a> {
    tree: &'a ModelTree,
    path: QueryPath,
    stack: Vec<NodeId>,
    descend: bool,
}

impl<'a> Query<'a> {
    /// Query `start` and all of its descendants.
    pub fn new(tree: &'a ModelTree, start: NodeId, path: QueryPath) -> Self {
        let stack = if tree.contains(start) { vec![start] } else { Vec::new() };
        Self {
            tree,
            path,
            stack,
            descend: true,
        }
    }

    /// Query the descendants of `start`, excluding `start` itself.
    pub fn children_of(tree: &'a ModelTree, start: NodeId, path: QueryPath) -> Self {
        let stack = tree
            .children(start)
            .map(|children| children.iter().rev().copied().collect())
            .unwrap_or_default();
        Self {
            tree,
            path,
            stack,
            descend: true,
        }
    }

    /// A query yielding nothing.
    pub fn empty(tree: &'a ModelTree) -> Self {
        Self {
            tree,
            path: QueryPath::invalid(""),
            stack: Vec::new(),
            descend: false,
        }
    }

    /// A query yielding exactly `node`.
    fn single(tree: &'a ModelTree, node: NodeId) -> Self {
        Self {
            tree,
            path: QueryPath::any(),
            stack: vec![node],
            descend: false,
        }
    }

    /// The path being matched.
    pub fn path(&self) -> &QueryPath {
        &self.path
    }
}

impl Iterator for Query<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.stack.pop() {
            let Some(node) = self.tree.get(id) else {
                continue;
            };
            if self.descend {
                if let Ok(children) = self.tree.children(id) {
                    self.stack.extend(children.iter().rev().copied());
                }
            }
            if QueryMatcher::matches(&self.path, &node) {
                return Some(id);
            }
        }
        None
    }
}

impl std::iter::FusedIterator for Query<'_> {}

/// Query operations on a [`ModelTree`].
pub trait TreeQueryExt {
    /// Query `root` and its descendants with a path string.
    ///
    /// Malformed paths yield nothing.
    fn query(&self, root: NodeId, path: &str) -> Query<'_>;

    /// Query `root` and its descendants with a parsed path.
    fn query_path(&self, root: NodeId, path: &QueryPath) -> Query<'_>;

    /// Query the descendants of `root` (excluding it) with a path string.
    fn query_children(&self, root: NodeId, path: &str) -> Query<'_>;

    /// Query the descendants of `root` (excluding it) with a parsed path.
    fn query_children_path(&self, root: NodeId, path: &QueryPath) -> Query<'_>;

    /// Query relative to `node`: each leading `..` climbs one parent, then the
    /// rest of the path runs over the anchor's descendants.
    ///
    /// A path made only of `..` segments yields the anchor itself. Climbing
    /// past the root yields nothing.
    fn query_parent_or_children(&self, node: NodeId, path: &str) -> Query<'_>;

    /// Relative query with a parsed path.
    fn query_parent_or_children_path(&self, node: NodeId, path: &QueryPath) -> Query<'_>;

    /// Check if a path matches a node. Stale handles never match.
    fn do_match(&self, node: NodeId, path: &QueryPath) -> bool;

    /// The priority of a path for a node, or `None` if it does not match.
    fn priority(&self, node: NodeId, path: &QueryPath) -> Option<QueryPriority>;
}

impl TreeQueryExt for ModelTree {
    fn query(&self, root: NodeId, path: &str) -> Query<'_> {
        Query::new(self, root, QueryPath::parse_lenient(path))
    }

    fn query_path(&self, root: NodeId, path: &QueryPath) -> Query<'_> {
        Query::new(self, root, path.clone())
    }

    fn query_children(&self, root: NodeId, path: &str) -> Query<'_> {
        Query::children_of(self, root, QueryPath::parse_lenient(path))
    }

    fn query_children_path(&self, root: NodeId, path: &QueryPath) -> Query<'_> {
        Query::children_of(self, root, path.clone())
    }

    fn query_parent_or_children(&self, node: NodeId, path: &str) -> Query<'_> {
        self.query_parent_or_children_path(node, &QueryPath::parse_lenient(path))
    }

    fn query_parent_or_children_path(&self, node: NodeId, path: &QueryPath) -> Query<'_> {
        let (levels, rest) = path.split_parent_prefix();

        let mut anchor = node;
        for _ in 0..levels {
            match self.parent(anchor) {
                Ok(Some(parent)) => anchor = parent,
                _ => return Query::empty(self),
            }
        }
        if !self.contains(anchor) {
            return Query::empty(self);
        }

        match rest {
            Some(rest) => Query::children_of(self, anchor, rest),
            None => Query::single(self, anchor),
        }
    }

    fn do_match(&self, node: NodeId, path: &QueryPath) -> bool {
        self.get(node)
            .is_some_and(|node| QueryMatcher::matches(path, &node))
    }

    fn priority(&self, node: NodeId, path: &QueryPath) -> Option<QueryPriority> {
        self.get(node)
            .and_then(|node| QueryMatcher::priority(path, &node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> (ModelTree, NodeId, NodeId, NodeId) {
        let mut tree = ModelTree::new();
        let root = tree.create_node("root");
        let panel = tree.create_node("panel");
        let button = tree.create_node("button");
        tree.add_children(root, [panel]).unwrap();
        tree.add_children(panel, [button]).unwrap();
        (tree, root, panel, button)
    }

    #[test]
    fn query_includes_root_children_excludes_it() {
        let (tree, root, panel, button) = tree();
        assert_eq!(tree.query(root, "*").collect::<Vec<_>>(), vec![root, panel, button]);
        assert_eq!(tree.query_children(root, "*").collect::<Vec<_>>(), vec![panel, button]);
    }

    #[test]
    fn malformed_query_yields_nothing() {
        let (tree, root, _, _) = tree();
        assert_eq!(tree.query(root, "panel//button").count(), 0);
        assert_eq!(tree.query(root, "").count(), 0);
    }

    #[test]
    fn parent_prefix_climbs_before_querying() {
        let (tree, root, panel, button) = tree();
        assert_eq!(
            tree.query_parent_or_children(button, "../../panel").collect::<Vec<_>>(),
            vec![panel]
        );
        assert_eq!(
            tree.query_parent_or_children(button, "..").collect::<Vec<_>>(),
            vec![panel]
        );
        assert_eq!(tree.query_parent_or_children(root, "../panel").count(), 0);
        assert_eq!(
            tree.query_parent_or_children(root, "button").collect::<Vec<_>>(),
            vec![button]
        );
    }

    #[test]
    fn stale_start_yields_nothing() {
        let (mut tree, _, panel, button) = tree();
        tree.destroy(panel).unwrap();
        assert_eq!(tree.query(panel, "*").count(), 0);
        assert_eq!(tree.query_children(panel, "*").count(), 0);
        assert!(!tree.do_match(button, &QueryPath::any()));
    }
}

//! Logging and debugging facilities for Trellis.
//!
//! Trellis uses the `tracing` crate for instrumentation. Every subsystem logs
//! under one of the [`targets`], so a subscriber can filter them
//! individually:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("trellis::instance=debug,trellis_core::tree=trace")
//!     .init();
//! ```
//!
//! Use [`TreeDebug`] to print a model tree with its identities:
//!
//! ```
//! use trellis_core::{ModelTree, logging::TreeDebug};
//!
//! let mut tree = ModelTree::new();
//! let root = tree.create_node("root");
//! let leaf = tree.create_node("leaf");
//! tree.add_children(root, [leaf]).unwrap();
//! tree.set_logical_ids(leaf, ["main"]).unwrap();
//!
//! let output = TreeDebug::new(&tree).format_subtree(root).unwrap();
//! assert!(output.contains("leaf #main"));
//! ```

use std::fmt;

use crate::error::TreeResult;
use crate::tree::{ModelTree, NodeId};

/// Target names for log filtering.
pub mod targets {
    /// Model tree mutations and notifications.
    pub const TREE: &str = "trellis_core::tree";
    /// Signal/slot emission.
    pub const SIGNAL: &str = "trellis_core::signal";
    /// Query path parsing and matching.
    pub const QUERY: &str = "trellis_query";
    /// Binder registration and resolution.
    pub const REGISTRY: &str = "trellis::registry";
    /// Binder instance map lifecycle.
    pub const INSTANCE: &str = "trellis::instance";
    /// Relational selector evaluation.
    pub const SELECTOR: &str = "trellis::selector";
    /// Capability dispatch.
    pub const DISPATCH: &str = "trellis::dispatch";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact single-line representation.
    Compact,
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show node handles.
    pub show_ids: bool,
    /// Whether to show logical and styling ids.
    pub show_identities: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: false,
            show_identities: true,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Options showing everything, handles included.
    pub fn detailed() -> Self {
        Self {
            show_ids: true,
            ..Default::default()
        }
    }

    /// Options showing names only.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_identities: false,
            ..Default::default()
        }
    }
}

/// Debug utility for visualizing a model tree.
#[derive(Debug, Clone)]
pub struct TreeDebug<'a> {
    tree: &'a ModelTree,
    options: TreeFormatOptions,
}

impl<'a> TreeDebug<'a> {
    /// Create a visualizer with default options.
    pub fn new(tree: &'a ModelTree) -> Self {
        Self::with_options(tree, TreeFormatOptions::default())
    }

    /// Create a visualizer with custom options.
    pub fn with_options(tree: &'a ModelTree, options: TreeFormatOptions) -> Self {
        Self { tree, options }
    }

    /// Format every tree in the arena.
    pub fn format_all(&self) -> TreeResult<String> {
        let mut output = format!("Model Tree ({} total nodes):\n", self.tree.len());
        let mut roots: Vec<NodeId> = self.tree.roots().collect();
        if roots.is_empty() {
            output.push_str("  (empty)\n");
        }
        roots.sort();
        for root in roots {
            self.format_subtree_into(root, 0, true, &mut output)?;
        }
        Ok(output)
    }

    /// Format a subtree starting from a specific node.
    pub fn format_subtree(&self, root: NodeId) -> TreeResult<String> {
        let mut output = String::new();
        self.format_subtree_into(root, 0, true, &mut output)?;
        Ok(output)
    }

    fn format_subtree_into(
        &self,
        id: NodeId,
        depth: usize,
        is_last: bool,
        output: &mut String,
    ) -> TreeResult<()> {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return Ok(());
        }

        let node = self.tree.node(id)?;
        output.push_str(&self.build_prefix(depth, is_last));
        output.push_str(if node.name().is_empty() {
            "(unnamed)"
        } else {
            node.name()
        });

        if self.options.show_identities {
            for tag in node.logical_ids() {
                output.push_str(" #");
                output.push_str(tag);
            }
            for tag in node.styling_ids() {
                output.push_str(" .");
                output.push_str(tag);
            }
        }
        if self.options.show_ids {
            output.push_str(&format!(" [{id:?}]"));
        }
        output.push('\n');

        let child_count = node.child_count();
        for (i, child) in node.children().enumerate() {
            self.format_subtree_into(child.id(), depth + 1, i + 1 == child_count, output)?;
        }
        Ok(())
    }

    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, tee, corner) = match self.options.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500}", "\u{2514}\u{2500}\u{2500}"),
            TreeStyle::Compact => ("", "-", "-"),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            prefix.push_str(&" ".repeat(self.options.indent_size));
        }
        prefix.push_str(if is_last { corner } else { tee });
        prefix.push(' ');
        prefix
    }
}

impl fmt::Display for TreeDebug<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format_all() {
            Ok(output) => f.write_str(&output),
            Err(e) => write!(f, "Error formatting model tree: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (ModelTree, NodeId) {
        let mut tree = ModelTree::new();
        let root = tree.create_node("window");
        let b1 = tree.create_node("button1");
        let b2 = tree.create_node("button2");
        tree.add_children(root, [b1, b2]).unwrap();
        tree.set_styling_ids(b2, ["primary"]).unwrap();
        (tree, root)
    }

    #[test]
    fn test_tree_format_empty() {
        let tree = ModelTree::new();
        let output = TreeDebug::new(&tree).format_all().unwrap();
        assert!(output.contains("Model Tree (0 total nodes)"));
        assert!(output.contains("(empty)"));
    }

    #[test]
    fn test_tree_format_hierarchy() {
        let (tree, root) = sample();
        let output = TreeDebug::new(&tree).format_subtree(root).unwrap();

        assert!(output.starts_with("window\n"));
        assert!(output.contains("\u{251c}\u{2500}\u{2500} button1"));
        assert!(output.contains("\u{2514}\u{2500}\u{2500} button2 .primary"));
    }

    #[test]
    fn test_tree_format_minimal() {
        let (tree, root) = sample();
        let debug = TreeDebug::with_options(&tree, TreeFormatOptions::minimal());
        let output = debug.format_subtree(root).unwrap();

        assert!(output.contains("button2"));
        assert!(!output.contains(".primary"));
        assert!(!output.contains('['));
    }

    #[test]
    fn test_tree_format_max_depth() {
        let (tree, root) = sample();
        let options = TreeFormatOptions {
            max_depth: Some(0),
            style: TreeStyle::Ascii,
            ..Default::default()
        };
        let output = TreeDebug::with_options(&tree, options).format_subtree(root).unwrap();
        assert_eq!(output, "window\n");
    }
}

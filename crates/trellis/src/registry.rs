//! Binder registry: query paths mapped to view declarations.
//!
//! A [`BinderRegistry`] holds an ordered list of [`Binding`]s. Resolving a
//! node evaluates every binding's query against it and picks the one with
//! the highest [`QueryPriority`]; among equal priorities the binding
//! registered first wins.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use trellis_core::{ModelTree, NodeId};
use trellis_query::{QueryPath, QueryPriority, TreeQueryExt};

use crate::error::{BindError, Result};
use crate::instance::BinderInstance;
use crate::sheet::BindingSheet;
use crate::view::ViewBackend;

/// One view declaration inside a [`Binder`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewSpec {
    /// The identity selectors and state filters use to address the view.
    #[serde(rename = "identity")]
    pub view_identity: String,
    /// Key the backend uses to pick a view factory.
    #[serde(rename = "factory")]
    pub factory_key: String,
    /// Key the backend uses to pick a parameter binder.
    #[serde(rename = "binder", default)]
    pub binder_key: String,
}

impl ViewSpec {
    /// Create a view declaration.
    pub fn new(
        view_identity: impl Into<String>,
        factory_key: impl Into<String>,
        binder_key: impl Into<String>,
    ) -> Self {
        Self {
            view_identity: view_identity.into(),
            factory_key: factory_key.into(),
            binder_key: binder_key.into(),
        }
    }
}

/// The ordered views created for every node a binding resolves to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Binder {
    views: Vec<ViewSpec>,
}

impl Binder {
    /// Create a binder with no views.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a view declaration.
    pub fn view(
        mut self,
        view_identity: impl Into<String>,
        factory_key: impl Into<String>,
        binder_key: impl Into<String>,
    ) -> Self {
        self.views.push(ViewSpec::new(view_identity, factory_key, binder_key));
        self
    }

    /// Add a prepared view declaration.
    pub fn with_spec(mut self, spec: ViewSpec) -> Self {
        self.views.push(spec);
        self
    }

    /// The view declarations, in creation order.
    pub fn views(&self) -> &[ViewSpec] {
        &self.views
    }
}

impl FromIterator<ViewSpec> for Binder {
    fn from_iter<I: IntoIterator<Item = ViewSpec>>(iter: I) -> Self {
        Self {
            views: iter.into_iter().collect(),
        }
    }
}

/// A query path mapped to a binder.
#[derive(Debug, Clone)]
pub struct Binding {
    /// The query selecting nodes.
    pub query: QueryPath,
    /// The binder instantiated for selected nodes.
    pub binder: Arc<Binder>,
    /// Registration order (for tie-breaking when priorities are equal).
    pub order: usize,
}

impl Binding {
    /// Priority of this binding for a node, or `None` if it does not match.
    pub fn priority(&self, tree: &ModelTree, node: NodeId) -> Option<QueryPriority> {
        tree.priority(node, &self.query)
    }
}

/// An ordered set of bindings.
#[derive(Debug, Clone, Default)]
pub struct BinderRegistry {
    bindings: Vec<Binding>,
}

impl BinderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from the bindings of a sheet.
    pub fn from_sheet(sheet: &BindingSheet) -> Result<Self> {
        let mut registry = Self::new();
        for entry in &sheet.bindings {
            registry.add(&entry.query, entry.views.iter().cloned().collect::<Binder>())?;
        }
        Ok(registry)
    }

    /// Build a registry from binding sheet TOML.
    pub fn from_toml(text: &str) -> Result<Self> {
        Self::from_sheet(&BindingSheet::from_toml(text)?)
    }

    /// Build a registry from a binding sheet file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_sheet(&BindingSheet::from_file(path)?)
    }

    /// Register a binding.
    ///
    /// A query that fails to parse is rejected here rather than silently
    /// never matching.
    pub fn add(&mut self, query: &str, binder: impl Into<Arc<Binder>>) -> Result<()> {
        let query = QueryPath::parse(query)?;
        self.add_path(query, binder);
        Ok(())
    }

    /// Register a binding with an already parsed query.
    pub fn add_path(&mut self, query: QueryPath, binder: impl Into<Arc<Binder>>) {
        let order = self.bindings.len();
        tracing::debug!(target: "trellis::registry", query = %query, order, "registered binding");
        self.bindings.push(Binding {
            query,
            binder: binder.into(),
            order,
        });
    }

    /// Find the index of the best binding for a node.
    pub fn resolve_index(&self, tree: &ModelTree, node: NodeId) -> Result<usize> {
        if !tree.contains(node) {
            return Err(BindError::InvalidNode);
        }

        let mut best: Option<(usize, QueryPriority)> = None;
        for (index, binding) in self.bindings.iter().enumerate() {
            let Some(priority) = binding.priority(tree, node) else {
                continue;
            };
            // Strictly greater only: the first registered wins ties.
            if best.as_ref().is_none_or(|(_, current)| priority > *current) {
                best = Some((index, priority));
            }
        }

        match best {
            Some((index, priority)) => {
                tracing::trace!(target: "trellis::registry", ?node, index, %priority, "resolved binding");
                Ok(index)
            }
            None => Err(BindError::NoMatchingBinder {
                node,
                path: tree.path(node)?,
            }),
        }
    }

    /// Find the best binding for a node.
    pub fn resolve(&self, tree: &ModelTree, node: NodeId) -> Result<&Binding> {
        let index = self.resolve_index(tree, node)?;
        Ok(&self.bindings[index])
    }

    /// Resolve a node and create its views.
    ///
    /// If the backend fails to create any view, the views created so far are
    /// disposed and no instance is returned.
    pub fn instantiate(
        &self,
        tree: &ModelTree,
        node: NodeId,
        backend: &mut dyn ViewBackend,
    ) -> Result<BinderInstance> {
        let index = self.resolve_index(tree, node)?;
        let binder = &self.bindings[index].binder;

        let mut views = Vec::with_capacity(binder.views().len());
        for spec in binder.views() {
            match backend.create_view(spec) {
                Ok(view) => views.push(view),
                Err(source) => {
                    tracing::debug!(target: "trellis::registry", ?node, factory = %spec.factory_key, "view creation failed, rolling back");
                    for (created_spec, view) in binder.views().iter().zip(views) {
                        backend.dispose_view(created_spec, view);
                    }
                    return Err(BindError::ViewCreation {
                        factory_key: spec.factory_key.clone(),
                        source,
                    });
                }
            }
        }

        Ok(BinderInstance::new(node, binder.clone(), index, views))
    }

    /// Get a binding by registration index.
    pub fn get(&self, index: usize) -> Option<&Binding> {
        self.bindings.get(index)
    }

    /// Get the number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterate over bindings in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    /// Remove all bindings.
    pub fn clear(&mut self) {
        self.bindings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViewError;
    use crate::view::ViewObject;
    use trellis_core::NodeRef;

    struct Label;
    impl ViewObject for Label {}

    #[derive(Default)]
    struct CountingBackend {
        created: usize,
        disposed: usize,
    }

    impl ViewBackend for CountingBackend {
        fn create_view(&mut self, spec: &ViewSpec) -> std::result::Result<Box<dyn ViewObject>, ViewError> {
            if spec.factory_key == "broken" {
                return Err(ViewError::UnknownFactory(spec.factory_key.clone()));
            }
            self.created += 1;
            Ok(Box::new(Label))
        }

        fn push_state(&mut self, _: &ViewSpec, _: NodeRef<'_>, _: &mut dyn ViewObject) {}

        fn dispose_view(&mut self, _: &ViewSpec, _: Box<dyn ViewObject>) {
            self.disposed += 1;
        }
    }

    fn apple_tree() -> (ModelTree, NodeId) {
        let mut tree = ModelTree::new();
        let root = tree.create_node("root");
        let apple = tree.create_node("apple");
        tree.add_children(root, [apple]).unwrap();
        tree.set_logical_ids(apple, ["fruit"]).unwrap();
        (tree, apple)
    }

    #[test]
    fn registry_rejects_malformed_queries() {
        let mut registry = BinderRegistry::new();
        assert!(matches!(
            registry.add("apple//pear", Binder::new()),
            Err(BindError::Query(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn higher_priority_wins() {
        let (tree, apple) = apple_tree();
        let mut registry = BinderRegistry::new();
        registry.add("apple", Binder::new().view("a", "text", "")).unwrap();
        registry.add("apple #fruit", Binder::new().view("b", "text", "")).unwrap();

        assert_eq!(registry.resolve(&tree, apple).unwrap().order, 1);
    }

    #[test]
    fn first_registered_wins_ties() {
        let (tree, apple) = apple_tree();
        let mut registry = BinderRegistry::new();
        registry.add("apple", Binder::new()).unwrap();
        registry.add("*/apple", Binder::new()).unwrap();

        for _ in 0..3 {
            assert_eq!(registry.resolve_index(&tree, apple).unwrap(), 0);
        }
    }

    #[test]
    fn no_match_is_an_error() {
        let (tree, apple) = apple_tree();
        let mut registry = BinderRegistry::new();
        registry.add("pear", Binder::new()).unwrap();

        match registry.resolve(&tree, apple) {
            Err(BindError::NoMatchingBinder { node, path }) => {
                assert_eq!(node, apple);
                assert_eq!(path, "root/apple");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn failed_instantiation_disposes_created_views() {
        let (tree, apple) = apple_tree();
        let mut registry = BinderRegistry::new();
        registry
            .add(
                "apple",
                Binder::new()
                    .view("label", "text", "")
                    .view("icon", "image", "")
                    .view("oops", "broken", ""),
            )
            .unwrap();

        let mut backend = CountingBackend::default();
        let result = registry.instantiate(&tree, apple, &mut backend);

        assert!(matches!(
            result,
            Err(BindError::ViewCreation { ref factory_key, .. }) if factory_key == "broken"
        ));
        assert_eq!(backend.created, 2);
        assert_eq!(backend.disposed, 2);
    }
}

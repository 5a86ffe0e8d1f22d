//! Named dispatch states matched against nodes and views.
//!
//! An [`EventStateMap`] associates state names with [`StateFilter`]s. A
//! state applies to a `(node, view)` pair when any of its filters matches.

use std::collections::{BTreeMap, BTreeSet};

use trellis_core::{ModelTree, NodeId};
use trellis_query::{QueryPath, TreeQueryExt};

use crate::error::{BindError, Result};
use crate::instance::BoundView;
use crate::sheet::BindingSheet;

/// One (query, view identity) filter of a state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateFilter {
    /// Query the node must match. `None` matches any node.
    pub query: Option<QueryPath>,
    /// Identity the supplied view must carry. `None` ignores the view.
    pub view_identity: Option<String>,
}

impl StateFilter {
    /// A filter matching every node.
    pub fn new() -> Self {
        Self::default()
    }

    /// A filter on a query string. An empty string matches any node.
    pub fn query(query: &str) -> Result<Self> {
        Self::new().with_query(query)
    }

    /// Require the node to match `query`.
    pub fn with_query(mut self, query: &str) -> Result<Self> {
        self.query = if query.trim().is_empty() {
            None
        } else {
            Some(QueryPath::parse(query)?)
        };
        Ok(self)
    }

    /// Require the supplied view to carry `identity`.
    pub fn with_view(mut self, identity: impl Into<String>) -> Self {
        self.view_identity = Some(identity.into());
        self
    }

    fn matches(&self, tree: &ModelTree, node: NodeId, view: Option<&BoundView<'_>>) -> bool {
        if let Some(identity) = &self.view_identity {
            if view.is_none_or(|view| view.identity() != identity) {
                return false;
            }
        }
        self.query.as_ref().is_none_or(|query| tree.do_match(node, query))
    }
}

/// State names mapped to the filters that select them.
#[derive(Debug, Clone, Default)]
pub struct EventStateMap {
    states: BTreeMap<String, Vec<StateFilter>>,
}

impl EventStateMap {
    /// Create an empty state map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state map from the states of a sheet.
    pub fn from_sheet(sheet: &BindingSheet) -> Result<Self> {
        let mut map = Self::new();
        for entry in &sheet.states {
            let mut filter = StateFilter::query(&entry.query)?;
            if let Some(view) = &entry.view {
                filter = filter.with_view(view.clone());
            }
            map.add_state(entry.name.clone(), filter);
        }
        Ok(map)
    }

    /// Add a filter under `name`. Filters under one name are alternatives.
    pub fn add_state(&mut self, name: impl Into<String>, filter: StateFilter) {
        let name = name.into();
        tracing::trace!(target: "trellis::dispatch", state = %name, ?filter, "added state filter");
        self.states.entry(name).or_default().push(filter);
    }

    /// Remove a state and all its filters.
    pub fn remove_state(&mut self, name: &str) -> bool {
        self.states.remove(name).is_some()
    }

    /// The registered state names, sorted.
    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }

    /// The filters registered under `name`.
    pub fn filters(&self, name: &str) -> &[StateFilter] {
        self.states.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Check if the state `name` applies to `node` (and `view`).
    ///
    /// Unknown states never apply. A stale node is an error.
    pub fn do_match(
        &self,
        tree: &ModelTree,
        name: &str,
        node: NodeId,
        view: Option<BoundView<'_>>,
    ) -> Result<bool> {
        if !tree.contains(node) {
            return Err(BindError::InvalidNode);
        }
        Ok(self
            .filters(name)
            .iter()
            .any(|filter| filter.matches(tree, node, view.as_ref())))
    }

    /// Every state that applies to `node` (and `view`).
    pub fn match_states(
        &self,
        tree: &ModelTree,
        node: NodeId,
        view: Option<BoundView<'_>>,
    ) -> Result<BTreeSet<String>> {
        if !tree.contains(node) {
            return Err(BindError::InvalidNode);
        }
        Ok(self
            .states
            .iter()
            .filter(|(_, filters)| {
                filters
                    .iter()
                    .any(|filter| filter.matches(tree, node, view.as_ref()))
            })
            .map(|(name, _)| name.clone())
            .collect())
    }
}

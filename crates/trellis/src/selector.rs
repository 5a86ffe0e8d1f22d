//! Relational selectors: finding receivers relative to a node.
//!
//! A [`RelationalSelector`] names a [`Relation`] to walk from a start node,
//! an optional query narrowing the related nodes, and an optional view
//! identity projecting each node onto its bound views. The surviving
//! candidates are filtered by a [`CapabilityProbe`].
//!
//! ```
//! use trellis::{Relation, RelationalSelector};
//! use trellis_core::ModelTree;
//!
//! let mut tree = ModelTree::new();
//! let root = tree.create_node("root");
//! let panel = tree.create_node("panel");
//! tree.add_children(root, [panel]).unwrap();
//!
//! let selector = RelationalSelector::parent();
//! assert_eq!(selector.relation(), Relation::Parent);
//! assert_eq!(selector.candidates(&tree, panel, None).len(), 1);
//! ```

use trellis_core::{Capability, ModelTree, NodeId};
use trellis_query::{QueryPath, TreeQueryExt};

use crate::dispatch::{DispatchRegistry, Payload, Receiver};
use crate::error::Result;
use crate::instance::BinderInstanceMap;
use crate::view::{CandidateRef, CapabilityProbe};

/// How candidates relate to the start node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// The start node itself.
    SelfNode,
    /// The parent, or the matching ancestors when a query is set.
    Parent,
    /// The children, or the matching descendants when a query is set.
    Child,
}

/// Reported capability and payload substituted for a selector's hits.
#[derive(Clone)]
pub struct Redirect {
    /// The capability reported instead of the requested one.
    pub capability: Capability,
    /// The payload reported instead of the supplied one, if any.
    pub payload: Option<Payload>,
}

impl std::fmt::Debug for Redirect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Redirect")
            .field("capability", &self.capability)
            .field("payload", &self.payload.is_some())
            .finish()
    }
}

/// A receiver candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Candidate {
    /// A model node.
    Node(NodeId),
    /// The view at `index` of the instance bound to `node`.
    View {
        /// The bound node.
        node: NodeId,
        /// Position among the instance's views.
        index: usize,
    },
}

impl Candidate {
    /// The model node behind the candidate.
    pub fn node(&self) -> NodeId {
        match *self {
            Candidate::Node(node) | Candidate::View { node, .. } => node,
        }
    }
}

/// One selected receiver with the capability and payload to report.
#[derive(Clone)]
pub struct SelectorHit {
    /// The requested capability, or the redirect capability.
    pub capability: Capability,
    /// The selected receiver.
    pub candidate: Candidate,
    /// The supplied payload, or the redirect payload.
    pub payload: Option<Payload>,
}

impl std::fmt::Debug for SelectorHit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectorHit")
            .field("capability", &self.capability)
            .field("candidate", &self.candidate)
            .field("payload", &self.payload.is_some())
            .finish()
    }
}

/// A (relation, query, view identity) tuple locating receivers.
#[derive(Debug, Clone)]
pub struct RelationalSelector {
    relation: Relation,
    query: Option<QueryPath>,
    view_identity: Option<String>,
    redirect: Option<Redirect>,
}

impl RelationalSelector {
    /// Create a selector for a relation with no query, view or redirect.
    pub fn new(relation: Relation) -> Self {
        Self {
            relation,
            query: None,
            view_identity: None,
            redirect: None,
        }
    }

    /// Select the start node.
    pub fn self_node() -> Self {
        Self::new(Relation::SelfNode)
    }

    /// Select the parent (or matching ancestors).
    pub fn parent() -> Self {
        Self::new(Relation::Parent)
    }

    /// Select the children (or matching descendants).
    pub fn child() -> Self {
        Self::new(Relation::Child)
    }

    /// Narrow the related nodes with a query path.
    ///
    /// An empty string clears the query.
    pub fn with_query(mut self, query: &str) -> Result<Self> {
        self.query = if query.trim().is_empty() {
            None
        } else {
            Some(QueryPath::parse(query)?)
        };
        Ok(self)
    }

    /// Narrow the related nodes with a parsed query path.
    pub fn with_query_path(mut self, query: QueryPath) -> Self {
        self.query = Some(query);
        self
    }

    /// Project each related node onto its bound views with this identity.
    pub fn with_view(mut self, view_identity: impl Into<String>) -> Self {
        self.view_identity = Some(view_identity.into());
        self
    }

    /// Report `capability` (and `payload`, when given) for every hit.
    pub fn with_redirect(mut self, capability: Capability, payload: Option<Payload>) -> Self {
        self.redirect = Some(Redirect { capability, payload });
        self
    }

    /// The relation walked from the start node.
    pub fn relation(&self) -> Relation {
        self.relation
    }

    /// The query narrowing related nodes, if any.
    pub fn query_path(&self) -> Option<&QueryPath> {
        self.query.as_ref()
    }

    /// The view identity candidates are projected onto, if any.
    pub fn view_identity(&self) -> Option<&str> {
        self.view_identity.as_deref()
    }

    /// The configured redirect, if any.
    pub fn redirect(&self) -> Option<&Redirect> {
        self.redirect.as_ref()
    }

    fn related_nodes(&self, tree: &ModelTree, start: NodeId) -> Vec<NodeId> {
        if !tree.contains(start) {
            return Vec::new();
        }
        match (self.relation, &self.query) {
            (Relation::SelfNode, _) => vec![start],
            (Relation::Parent, None) => tree.parent(start).ok().flatten().into_iter().collect(),
            (Relation::Parent, Some(query)) if query.up_levels() > 0 => {
                tree.query_parent_or_children_path(start, query).collect()
            }
            // do_match walks each ancestor's whole chain, so the query is
            // effectively evaluated from the tree root.
            (Relation::Parent, Some(query)) => tree
                .ancestors(start)
                .unwrap_or_default()
                .into_iter()
                .filter(|&ancestor| tree.do_match(ancestor, query))
                .collect(),
            (Relation::Child, None) => tree.children(start).map(<[NodeId]>::to_vec).unwrap_or_default(),
            (Relation::Child, Some(query)) => tree.query_parent_or_children_path(start, query).collect(),
        }
    }

    /// The candidates related to `start`, before capability filtering.
    ///
    /// With a view identity set, each related node contributes its bound
    /// views with that identity; untracked nodes (or no `instances`)
    /// contribute nothing.
    pub fn candidates(
        &self,
        tree: &ModelTree,
        start: NodeId,
        instances: Option<&BinderInstanceMap>,
    ) -> Vec<Candidate> {
        let nodes = self.related_nodes(tree, start);
        let Some(identity) = self.view_identity.as_deref() else {
            return nodes.into_iter().map(Candidate::Node).collect();
        };
        let Some(instances) = instances else {
            return Vec::new();
        };

        let mut candidates = Vec::new();
        for node in nodes {
            candidates.extend(
                instances
                    .views_of(node)
                    .filter(|view| view.identity() == identity)
                    .map(|view| Candidate::View {
                        node,
                        index: view.index,
                    }),
            );
        }
        candidates
    }

    /// The candidates supporting `capability`, with the capability and
    /// payload to report for each.
    pub fn query(
        &self,
        tree: &ModelTree,
        capability: Capability,
        start: NodeId,
        payload: Option<&Payload>,
        instances: Option<&BinderInstanceMap>,
        probe: &dyn CapabilityProbe,
    ) -> Vec<SelectorHit> {
        let (reported, reported_payload) = match &self.redirect {
            Some(redirect) => (
                redirect.capability,
                redirect.payload.as_ref().or(payload).cloned(),
            ),
            None => (capability, payload.cloned()),
        };

        let hits: Vec<SelectorHit> = self
            .candidates(tree, start, instances)
            .into_iter()
            .filter(|&candidate| supports(tree, instances, probe, candidate, capability))
            .map(|candidate| SelectorHit {
                capability: reported,
                candidate,
                payload: reported_payload.clone(),
            })
            .collect();

        tracing::trace!(target: "trellis::selector", relation = ?self.relation, %capability, ?start, hits = hits.len(), "selector query");
        hits
    }

    /// Find receivers and run the dispatch executor of each hit's capability
    /// against them, with `start` as the sender.
    ///
    /// Returns how many receivers were invoked.
    #[allow(clippy::too_many_arguments)]
    pub fn send(
        &self,
        tree: &ModelTree,
        mut instances: Option<&mut BinderInstanceMap>,
        capability: Capability,
        start: NodeId,
        payload: Option<Payload>,
        dispatch: &DispatchRegistry,
        probe: &dyn CapabilityProbe,
    ) -> usize {
        let hits = self.query(tree, capability, start, payload.as_ref(), instances.as_deref(), probe);

        let mut invoked = 0;
        for hit in hits {
            let node = match tree.node(hit.candidate.node()) {
                Ok(node) => node,
                Err(_) => continue,
            };
            let receiver = match hit.candidate {
                Candidate::Node(_) => Receiver::Node(node),
                Candidate::View { node: id, index } => {
                    let Some((spec, view)) = instances
                        .as_deref_mut()
                        .and_then(|map| map.get_mut(id))
                        .and_then(|instance| instance.view_mut(index))
                    else {
                        continue;
                    };
                    Receiver::View { node, spec, view }
                }
            };
            if dispatch.execute(hit.capability, receiver, start, hit.payload.as_ref()) {
                invoked += 1;
            }
        }

        tracing::debug!(target: "trellis::selector", %capability, ?start, invoked, "sent");
        invoked
    }
}

fn supports(
    tree: &ModelTree,
    instances: Option<&BinderInstanceMap>,
    probe: &dyn CapabilityProbe,
    candidate: Candidate,
    capability: Capability,
) -> bool {
    let Some(node) = tree.get(candidate.node()) else {
        return false;
    };
    match candidate {
        Candidate::Node(_) => probe.supports(CandidateRef::Node(node), capability),
        Candidate::View { node: id, index } => instances
            .and_then(|map| map.get(id))
            .and_then(|instance| instance.view(index))
            .is_some_and(|view| {
                probe.supports(
                    CandidateRef::View {
                        node,
                        spec: view.spec,
                        view: view.view,
                    },
                    capability,
                )
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::DeclaredCapabilities;

    const FOCUS: Capability = Capability::new("focus");

    /// root → a → b, every node focusable.
    fn chain() -> (ModelTree, NodeId, NodeId, NodeId) {
        let mut tree = ModelTree::new();
        let root = tree.create_node("root");
        let a = tree.create_node("a");
        let b = tree.create_node("b");
        tree.add_children(root, [a]).unwrap();
        tree.add_children(a, [b]).unwrap();
        for node in [root, a, b] {
            tree.add_capability(node, FOCUS).unwrap();
        }
        (tree, root, a, b)
    }

    fn nodes(hits: Vec<SelectorHit>) -> Vec<NodeId> {
        hits.into_iter().map(|hit| hit.candidate.node()).collect()
    }

    #[test]
    fn relations_without_query() {
        let (tree, root, a, b) = chain();
        let probe = DeclaredCapabilities;

        let hits = RelationalSelector::self_node().query(&tree, FOCUS, a, None, None, &probe);
        assert_eq!(nodes(hits), vec![a]);

        let hits = RelationalSelector::child().query(&tree, FOCUS, root, None, None, &probe);
        assert_eq!(nodes(hits), vec![a]);

        let hits = RelationalSelector::parent().query(&tree, FOCUS, b, None, None, &probe);
        assert_eq!(nodes(hits), vec![a]);

        let hits = RelationalSelector::parent().query(&tree, FOCUS, root, None, None, &probe);
        assert!(hits.is_empty());
    }

    #[test]
    fn parent_query_selects_matching_ancestors() {
        let (tree, root, a, b) = chain();
        let probe = DeclaredCapabilities;

        let selector = RelationalSelector::parent().with_query("*").unwrap();
        assert_eq!(
            nodes(selector.query(&tree, FOCUS, b, None, None, &probe)),
            vec![a, root]
        );

        let selector = RelationalSelector::parent().with_query("/root").unwrap();
        assert_eq!(nodes(selector.query(&tree, FOCUS, b, None, None, &probe)), vec![root]);
    }

    #[test]
    fn parent_query_climbs_relative_to_start() {
        let (tree, root, a, b) = chain();
        let probe = DeclaredCapabilities;
        let hits = |query: &str| {
            let selector = RelationalSelector::parent().with_query(query).unwrap();
            nodes(selector.query(&tree, FOCUS, b, None, None, &probe))
        };

        assert_eq!(hits(".."), vec![a]);
        assert_eq!(hits("../.."), vec![root]);
        assert_eq!(hits("../b"), vec![b]);
        assert!(hits("../../..").is_empty());
    }

    #[test]
    fn child_query_selects_descendants() {
        let (tree, root, _, b) = chain();
        let selector = RelationalSelector::child().with_query("b").unwrap();
        assert_eq!(
            nodes(selector.query(&tree, FOCUS, root, None, None, &DeclaredCapabilities)),
            vec![b]
        );
    }

    #[test]
    fn missing_capability_is_excluded() {
        let (mut tree, root, a, _) = chain();
        tree.remove_capability(a, FOCUS).unwrap();
        let hits = RelationalSelector::child().query(&tree, FOCUS, root, None, None, &DeclaredCapabilities);
        assert!(hits.is_empty());
    }

    #[test]
    fn redirect_changes_report_not_selection() {
        const ACTIVATE: Capability = Capability::new("activate");
        let (tree, root, a, _) = chain();
        let selector = RelationalSelector::child().with_redirect(ACTIVATE, Some(crate::dispatch::payload(7u32)));

        let hits = selector.query(&tree, FOCUS, root, None, None, &DeclaredCapabilities);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].candidate, Candidate::Node(a));
        assert_eq!(hits[0].capability, ACTIVATE);
        let payload = hits[0].payload.as_ref().and_then(|p| p.downcast_ref::<u32>());
        assert_eq!(payload, Some(&7));
    }

    #[test]
    fn view_projection_needs_instances() {
        let (tree, root, _, _) = chain();
        let selector = RelationalSelector::child().with_view("label");
        assert!(selector.candidates(&tree, root, None).is_empty());
    }

    #[test]
    fn stale_start_selects_nothing() {
        let (mut tree, _, a, _) = chain();
        tree.destroy(a).unwrap();
        assert!(RelationalSelector::self_node().candidates(&tree, a, None).is_empty());
    }
}

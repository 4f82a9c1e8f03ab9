//! In-memory graph snapshot: node map plus orientation-specific adjacency.
//!
//! The [`GraphStore`] never talks to SQLite. It is built wholesale from the
//! rows the durable store returns ([`GraphStore::build`]) and afterwards only
//! changes through [`GraphStore::apply`], which mirrors a mutation the
//! durable store has already committed.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::graph::mutation::Mutation;
use crate::types::{Edge, Node, Orientation};

/// Neighbor set type shared by every adjacency map.
pub type NeighborSet = HashSet<String>;

// ---------------------------------------------------------------------------
// Adjacency
// ---------------------------------------------------------------------------

/// Adjacency layout, one variant per orientation.
#[derive(Debug, Clone)]
enum Adjacency {
    /// Undirected: one symmetric neighbor set per node.
    Symmetric(HashMap<String, NeighborSet>),
    /// Directed: callees in `out`, callers in `inbound`.
    Split {
        out: HashMap<String, NeighborSet>,
        inbound: HashMap<String, NeighborSet>,
    },
}

impl Adjacency {
    fn new(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Undirected => Self::Symmetric(HashMap::new()),
            Orientation::Directed => Self::Split {
                out: HashMap::new(),
                inbound: HashMap::new(),
            },
        }
    }

    fn add_vertex(&mut self, id: &str) {
        match self {
            Self::Symmetric(adj) => {
                adj.entry(id.to_string()).or_default();
            }
            Self::Split { out, inbound } => {
                out.entry(id.to_string()).or_default();
                inbound.entry(id.to_string()).or_default();
            }
        }
    }

    /// Detach `id` from every neighbor and drop its own sets.
    fn remove_vertex(&mut self, id: &str) {
        match self {
            Self::Symmetric(adj) => {
                if let Some(neighbors) = adj.remove(id) {
                    for n in &neighbors {
                        if let Some(set) = adj.get_mut(n) {
                            set.remove(id);
                        }
                    }
                }
            }
            Self::Split { out, inbound } => {
                if let Some(callees) = out.remove(id) {
                    for callee in &callees {
                        if let Some(set) = inbound.get_mut(callee) {
                            set.remove(id);
                        }
                    }
                }
                if let Some(callers) = inbound.remove(id) {
                    for caller in &callers {
                        if let Some(set) = out.get_mut(caller) {
                            set.remove(id);
                        }
                    }
                }
            }
        }
    }

    fn outbound(&self, id: &str) -> Option<&NeighborSet> {
        match self {
            Self::Symmetric(adj) => adj.get(id),
            Self::Split { out, .. } => out.get(id),
        }
    }

    fn inbound(&self, id: &str) -> Option<&NeighborSet> {
        match self {
            Self::Symmetric(adj) => adj.get(id),
            Self::Split { inbound, .. } => inbound.get(id),
        }
    }

    /// Caller guarantees both endpoints are registered vertices.
    fn insert(&mut self, source: &str, target: &str) -> bool {
        match self {
            Self::Symmetric(adj) => {
                let fresh = adj
                    .get_mut(source)
                    .is_some_and(|s| s.insert(target.to_string()));
                if fresh {
                    if let Some(set) = adj.get_mut(target) {
                        set.insert(source.to_string());
                    }
                }
                fresh
            }
            Self::Split { out, inbound } => {
                let fresh = out
                    .get_mut(source)
                    .is_some_and(|s| s.insert(target.to_string()));
                if fresh {
                    if let Some(set) = inbound.get_mut(target) {
                        set.insert(source.to_string());
                    }
                }
                fresh
            }
        }
    }

    fn remove(&mut self, source: &str, target: &str) -> bool {
        match self {
            Self::Symmetric(adj) => {
                let removed = adj.get_mut(source).is_some_and(|s| s.remove(target));
                if let Some(set) = adj.get_mut(target) {
                    set.remove(source);
                }
                removed
            }
            Self::Split { out, inbound } => {
                let removed = out.get_mut(source).is_some_and(|s| s.remove(target));
                if let Some(set) = inbound.get_mut(target) {
                    set.remove(source);
                }
                removed
            }
        }
    }

    fn edge_count(&self) -> usize {
        match self {
            Self::Symmetric(adj) => adj.values().map(HashSet::len).sum::<usize>() / 2,
            Self::Split { out, .. } => out.values().map(HashSet::len).sum(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Degree of a node. The in/out split is only reported for directed graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Degree {
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_degree: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_degree: Option<usize>,
}

/// Outcome of rebuilding a store from durable rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct HydrationReport {
    pub nodes: usize,
    pub edges: usize,
    /// Rows skipped because an endpoint is missing, they loop onto
    /// themselves, or they duplicate an edge already loaded.
    pub dropped_edges: usize,
}

// ---------------------------------------------------------------------------
// GraphStore
// ---------------------------------------------------------------------------

/// The authoritative in-memory snapshot of the graph.
#[derive(Debug, Clone)]
pub struct GraphStore {
    orientation: Orientation,
    nodes: HashMap<String, Node>,
    adjacency: Adjacency,
}

impl GraphStore {
    /// An empty store for the given orientation.
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            nodes: HashMap::new(),
            adjacency: Adjacency::new(orientation),
        }
    }

    /// Build a complete store from durable rows.
    ///
    /// Edges whose endpoints are not both present in `nodes`, self-loops,
    /// and duplicates are discarded and counted in the report.
    pub fn build(
        orientation: Orientation,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
    ) -> (Self, HydrationReport) {
        let (store, report, _) = Self::build_with_rejects(orientation, nodes, edges);
        (store, report)
    }

    /// Like [`GraphStore::build`], also handing back the rejected rows so
    /// the caller can purge them from the durable store.
    pub fn build_with_rejects(
        orientation: Orientation,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
    ) -> (Self, HydrationReport, Vec<Edge>) {
        let mut store = Self::new(orientation);
        for node in nodes {
            store.insert_node(node);
        }

        let mut rejected = Vec::new();
        for edge in edges {
            if edge.is_self_loop()
                || !store.contains(&edge.source)
                || !store.contains(&edge.target)
                || !store.adjacency.insert(&edge.source, &edge.target)
            {
                rejected.push(edge);
            }
        }

        let report = HydrationReport {
            nodes: store.node_count(),
            edges: store.edge_count(),
            dropped_edges: rejected.len(),
        };
        (store, report, rejected)
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    // -------------------------------------------------------------------
    // Node access
    // -------------------------------------------------------------------

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Label of `id`, or the placeholder when it is unknown.
    pub fn label_of(&self, id: &str) -> &str {
        self.nodes
            .get(id)
            .map(|n| n.label.as_str())
            .unwrap_or(crate::types::UNKNOWN_LABEL)
    }

    /// All nodes, in unspecified order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All node ids sorted ascending.
    pub fn sorted_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    // -------------------------------------------------------------------
    // Adjacency access
    // -------------------------------------------------------------------

    /// Nodes reachable over one edge: neighbors (undirected) or callees
    /// (directed).
    pub fn outbound(&self, id: &str) -> Option<&NeighborSet> {
        self.adjacency.outbound(id)
    }

    /// Nodes with an edge into `id`: neighbors (undirected) or callers
    /// (directed).
    pub fn inbound(&self, id: &str) -> Option<&NeighborSet> {
        self.adjacency.inbound(id)
    }

    /// Whether the edge exists, in the orientation's sense.
    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        self.outbound(source).is_some_and(|s| s.contains(target))
    }

    pub fn degree(&self, id: &str) -> Degree {
        let out = self.outbound(id).map_or(0, HashSet::len);
        match self.orientation {
            Orientation::Undirected => Degree {
                total: out,
                in_degree: None,
                out_degree: None,
            },
            Orientation::Directed => {
                let inc = self.inbound(id).map_or(0, HashSet::len);
                Degree {
                    total: out + inc,
                    in_degree: Some(inc),
                    out_degree: Some(out),
                }
            }
        }
    }

    // -------------------------------------------------------------------
    // Aggregates
    // -------------------------------------------------------------------

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Edge count; undirected edges are counted once.
    pub fn edge_count(&self) -> usize {
        self.adjacency.edge_count()
    }

    pub fn isolated_count(&self) -> usize {
        self.nodes
            .keys()
            .filter(|id| self.degree(id).total == 0)
            .count()
    }

    /// Every edge once, sorted. Undirected pairs come out as `source < target`.
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = Vec::with_capacity(self.edge_count());
        for id in self.nodes.keys() {
            if let Some(targets) = self.outbound(id) {
                for t in targets {
                    if self.orientation.is_directed() || id < t {
                        edges.push(Edge::new(id.as_str(), t.as_str()));
                    }
                }
            }
        }
        edges.sort();
        edges
    }

    // -------------------------------------------------------------------
    // Mutation mirror
    // -------------------------------------------------------------------

    /// Mirror a mutation the durable store has committed.
    ///
    /// Returns whether the in-memory state changed. Removing an absent edge
    /// is the only expected no-op.
    pub fn apply(&mut self, mutation: &Mutation) -> bool {
        match mutation {
            Mutation::AddNode(node) => {
                if self.contains(&node.id) {
                    return false;
                }
                self.insert_node(node.clone());
                true
            }
            Mutation::UpdateNode(node) => match self.nodes.get_mut(&node.id) {
                Some(existing) => {
                    existing.label = node.label.clone();
                    existing.attributes = node.attributes.clone();
                    true
                }
                None => false,
            },
            Mutation::RemoveNode { id } => {
                if self.nodes.remove(id).is_none() {
                    return false;
                }
                self.adjacency.remove_vertex(id);
                true
            }
            Mutation::AddEdge(edge) => {
                if edge.is_self_loop() || !self.contains(&edge.source) || !self.contains(&edge.target)
                {
                    return false;
                }
                self.adjacency.insert(&edge.source, &edge.target)
            }
            Mutation::RemoveEdge(edge) => self.adjacency.remove(&edge.source, &edge.target),
        }
    }

    fn insert_node(&mut self, node: Node) {
        self.adjacency.add_vertex(&node.id);
        self.nodes.insert(node.id.clone(), node);
    }

    // -------------------------------------------------------------------
    // Consistency
    // -------------------------------------------------------------------

    /// List every structural invariant violation. Empty means healthy.
    pub fn verify(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for id in self.nodes.keys() {
            let Some(out) = self.outbound(id) else {
                problems.push(format!("{id}: missing adjacency entry"));
                continue;
            };
            for t in out {
                if t == id {
                    problems.push(format!("{id}: self-loop"));
                }
                if !self.contains(t) {
                    problems.push(format!("{id} -> {t}: dangling target"));
                }
                if !self.inbound(t).is_some_and(|s| s.contains(id)) {
                    problems.push(format!("{id} -> {t}: missing reverse entry"));
                }
            }
            if let Some(inc) = self.inbound(id) {
                for s in inc {
                    if !self.contains(s) {
                        problems.push(format!("{s} -> {id}: dangling source"));
                    }
                    if !self.outbound(s).is_some_and(|o| o.contains(id)) {
                        problems.push(format!("{s} -> {id}: missing forward entry"));
                    }
                }
            }
        }
        problems
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Attributes;

    fn n(id: &str) -> Node {
        Node::new(id, Some(id), Attributes::new())
    }

    fn e(s: &str, t: &str) -> Edge {
        Edge::new(s, t)
    }

    fn build(orientation: Orientation, ids: &[&str], edges: &[(&str, &str)]) -> GraphStore {
        let nodes = ids.iter().map(|id| n(id)).collect();
        let edges = edges.iter().map(|(s, t)| e(s, t)).collect();
        GraphStore::build(orientation, nodes, edges).0
    }

    #[test]
    fn build_drops_dangling_edges_and_counts_them() {
        let nodes = vec![n("a"), n("b")];
        let edges = vec![e("a", "b"), e("a", "ghost"), e("phantom", "b")];
        let (store, report) = GraphStore::build(Orientation::Undirected, nodes, edges);

        assert_eq!(
            report,
            HydrationReport {
                nodes: 2,
                edges: 1,
                dropped_edges: 2
            }
        );
        assert!(store.verify().is_empty());
    }

    #[test]
    fn build_drops_self_loops_and_reverse_duplicates() {
        let nodes = vec![n("a"), n("b")];
        let edges = vec![e("a", "b"), e("b", "a"), e("a", "a")];

        let (_, undirected) = GraphStore::build(Orientation::Undirected, nodes.clone(), edges.clone());
        assert_eq!(undirected.edges, 1);
        assert_eq!(undirected.dropped_edges, 2);

        let (_, directed) = GraphStore::build(Orientation::Directed, nodes, edges);
        assert_eq!(directed.edges, 2);
        assert_eq!(directed.dropped_edges, 1);
    }

    #[test]
    fn build_hands_back_the_exact_rejected_rows() {
        let nodes = vec![n("a"), n("b")];
        let edges = vec![e("a", "b"), e("b", "a"), e("a", "ghost"), e("b", "b")];
        let (store, report, rejected) =
            GraphStore::build_with_rejects(Orientation::Undirected, nodes, edges);

        assert_eq!(rejected, vec![e("b", "a"), e("a", "ghost"), e("b", "b")]);
        assert_eq!(report.dropped_edges, rejected.len());
        assert!(store.has_edge("a", "b"));
    }

    #[test]
    fn undirected_adjacency_is_symmetric() {
        let store = build(Orientation::Undirected, &["a", "b", "c"], &[("a", "b"), ("c", "b")]);
        assert!(store.has_edge("a", "b"));
        assert!(store.has_edge("b", "a"));
        assert!(store.has_edge("b", "c"));
        assert_eq!(store.degree("b").total, 2);
        assert_eq!(store.degree("b").in_degree, None);
        assert_eq!(store.edge_count(), 2);
    }

    #[test]
    fn directed_adjacency_is_split() {
        let store = build(Orientation::Directed, &["a", "b", "c"], &[("a", "b"), ("c", "b")]);
        assert!(store.has_edge("a", "b"));
        assert!(!store.has_edge("b", "a"));
        let deg = store.degree("b");
        assert_eq!(deg.total, 2);
        assert_eq!(deg.in_degree, Some(2));
        assert_eq!(deg.out_degree, Some(0));
        assert_eq!(store.edge_count(), 2);
    }

    #[test]
    fn remove_node_detaches_all_neighbors() {
        let mut store = build(
            Orientation::Directed,
            &["a", "b", "c"],
            &[("a", "b"), ("b", "c"), ("c", "a")],
        );
        assert!(store.apply(&Mutation::RemoveNode { id: "b".into() }));

        assert!(!store.contains("b"));
        assert_eq!(store.edges(), vec![e("c", "a")]);
        assert!(store.verify().is_empty());
    }

    #[test]
    fn remove_absent_edge_is_noop() {
        let mut store = build(Orientation::Undirected, &["a", "b"], &[]);
        assert!(!store.apply(&Mutation::RemoveEdge(e("a", "b"))));
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn undirected_edge_removal_works_from_either_end() {
        let mut store = build(Orientation::Undirected, &["a", "b"], &[("a", "b")]);
        assert!(store.apply(&Mutation::RemoveEdge(e("b", "a"))));
        assert!(!store.has_edge("a", "b"));
        assert!(store.verify().is_empty());
    }

    #[test]
    fn add_edge_mirror_ignores_invalid_endpoints() {
        let mut store = build(Orientation::Directed, &["a"], &[]);
        assert!(!store.apply(&Mutation::AddEdge(e("a", "a"))));
        assert!(!store.apply(&Mutation::AddEdge(e("a", "ghost"))));
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn update_replaces_label_and_attributes_only() {
        let mut store = build(Orientation::Undirected, &["a", "b"], &[("a", "b")]);
        let updated = Node::new("a", Some("Alice"), Attributes::new().with("tier", "core"));
        assert!(store.apply(&Mutation::UpdateNode(updated)));

        let a = store.node("a").unwrap();
        assert_eq!(a.label, "Alice");
        assert_eq!(a.attributes.len(), 1);
        assert!(store.has_edge("a", "b"));
    }

    #[test]
    fn isolated_count_and_edges_listing() {
        let store = build(Orientation::Undirected, &["a", "b", "c"], &[("b", "a")]);
        assert_eq!(store.isolated_count(), 1);
        assert_eq!(store.edges(), vec![e("a", "b")]);
    }
}

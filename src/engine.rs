//! The graph engine: one owned instance tying the durable store to the
//! in-memory graph.
//!
//! Reads take the graph read lock and never touch SQLite. Mutations are
//! serialized by the writer mutex, validated against the current snapshot,
//! committed to SQLite, and only then mirrored into memory under the write
//! lock. A failed commit leaves memory untouched.

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::db::store::DurableStore;
use crate::error::{Result, SocialFlowError};
use crate::graph::mutation::Mutation;
use crate::graph::query::{self, GraphProjection, NodeSummary, Overview, SearchPage, SearchParams};
use crate::graph::similarity::{self, Recommendation};
use crate::graph::store::{GraphStore, HydrationReport};
use crate::graph::traversal::{GraphTraversal, ImpactReport, NeighborListing, PathResult};
use crate::types::{normalize_label, Attributes, Edge, Node, Orientation};

pub struct GraphEngine {
    config: EngineConfig,
    writer: Mutex<DurableStore>,
    graph: RwLock<GraphStore>,
}

impl std::fmt::Debug for GraphEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphEngine")
            .field("orientation", &self.config.orientation)
            .field("db_path", &self.config.db_path)
            .finish_non_exhaustive()
    }
}

impl GraphEngine {
    // -------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------

    /// Open the database named in `config` and hydrate the graph from it.
    ///
    /// The parent directory of an on-disk database is created if missing.
    pub fn open(config: EngineConfig) -> Result<Self> {
        if config.db_path != ":memory:" {
            if let Some(parent) = std::path::Path::new(&config.db_path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }
        let durable = DurableStore::open(&config.db_path)?;
        Self::with_store(durable, config)
    }

    /// A private in-memory engine.
    pub fn in_memory(orientation: Orientation) -> Result<Self> {
        Self::open(EngineConfig::in_memory(orientation))
    }

    /// Wrap an already-open durable store and hydrate from it.
    pub fn with_store(durable: DurableStore, config: EngineConfig) -> Result<Self> {
        let engine = Self {
            graph: RwLock::new(GraphStore::new(config.orientation)),
            writer: Mutex::new(durable),
            config,
        };
        engine.hydrate()?;
        info!(
            orientation = %engine.config.orientation,
            db = %engine.config.db_path,
            "graph engine ready"
        );
        Ok(engine)
    }

    /// Rebuild the in-memory graph from SQLite.
    ///
    /// Edge rows the graph cannot hold (dangling, self-loop, duplicate) are
    /// deleted from SQLite before the swap so both stores agree.
    ///
    /// The replacement is built off to the side and swapped in under the
    /// write lock, so readers see either the old graph or the new one.
    pub fn hydrate(&self) -> Result<HydrationReport> {
        let durable = self.writer.lock();
        let nodes = durable.load_nodes()?;
        let edges = durable.load_edges()?;
        let (fresh, report, rejected) =
            GraphStore::build_with_rejects(self.config.orientation, nodes, edges);

        // SQLite must never hold an edge row the graph did not load.
        if !rejected.is_empty() {
            let purged = durable.purge_edges(&rejected)?;
            warn!(dropped = report.dropped_edges, purged, "purged invalid edge rows during hydration");
        }
        *self.graph.write() = fresh;

        info!(
            nodes = report.nodes,
            edges = report.edges,
            dropped = report.dropped_edges,
            "hydrated graph"
        );
        Ok(report)
    }

    /// Close the database. The engine is consumed.
    pub fn shutdown(self) -> Result<()> {
        info!("shutting down graph engine");
        self.writer.into_inner().close()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn orientation(&self) -> Orientation {
        self.config.orientation
    }

    /// Run `f` against a consistent snapshot.
    pub fn read<T>(&self, f: impl FnOnce(&GraphStore) -> T) -> T {
        f(&self.graph.read())
    }

    // -------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------

    pub fn overview(&self) -> Overview {
        self.read(query::overview)
    }

    /// Graph projection capped at `limit` nodes (config default if `None`).
    pub fn graph(&self, limit: Option<usize>) -> GraphProjection {
        let limit = limit.unwrap_or(self.config.limits.graph_limit);
        self.read(|g| query::project(g, limit))
    }

    pub fn node_detail(&self, id: &str) -> Result<NodeSummary> {
        self.read(|g| query::detail(g, id))
            .ok_or_else(|| SocialFlowError::node_not_found(id))
    }

    pub fn neighbors(&self, id: &str) -> Result<NeighborListing> {
        let key = self.config.similarity_key();
        self.read(|g| GraphTraversal::new(g).neighbors(id, key))
    }

    pub fn shortest_path(&self, from: &str, to: &str) -> Result<PathResult> {
        self.read(|g| GraphTraversal::new(g).shortest_path(from, to))
    }

    pub fn blast_radius(&self, id: &str) -> Result<ImpactReport> {
        self.read(|g| GraphTraversal::new(g).blast_radius(id))
    }

    /// Search with the page size defaulted from config when zero.
    pub fn search(&self, params: &SearchParams) -> SearchPage {
        let mut params = params.clone();
        if params.page_size == 0 {
            params.page_size = self.config.limits.page_size;
        }
        self.read(|g| query::search(g, &params))
    }

    /// Top-`top_k` recommendations; unknown ids yield an empty list.
    pub fn recommend(&self, id: &str, top_k: Option<usize>) -> Vec<Recommendation> {
        let limit = top_k.unwrap_or(self.config.limits.default_top_k);
        let key = self.config.similarity_key();
        self.read(|g| similarity::recommend(g, id, limit, key))
    }

    // -------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------

    /// Create a node. The id is trimmed and must be non-empty and unused;
    /// a blank label becomes the placeholder.
    pub fn add_node(&self, id: &str, label: Option<&str>, attributes: Attributes) -> Result<Node> {
        let id = id.trim();
        let node = Node::new(id, label, attributes);
        self.mutate(|g| {
            if id.is_empty() {
                return Err(SocialFlowError::InvalidInput(
                    "node id must be a non-empty string".into(),
                ));
            }
            if g.contains(id) {
                return Err(SocialFlowError::Conflict(format!("node '{id}' already exists")));
            }
            Ok(Mutation::AddNode(node.clone()))
        })?;
        Ok(node)
    }

    /// Replace the label (when given and non-blank) and/or the attribute bag
    /// (when given) of an existing node.
    pub fn update_node(
        &self,
        id: &str,
        label: Option<&str>,
        attributes: Option<Attributes>,
    ) -> Result<Node> {
        let mut updated = None;
        self.mutate(|g| {
            let current = g.node(id).ok_or_else(|| SocialFlowError::node_not_found(id))?;
            let node = Node {
                id: current.id.clone(),
                label: normalize_label(label).unwrap_or_else(|| current.label.clone()),
                attributes: attributes.unwrap_or_else(|| current.attributes.clone()),
            };
            updated = Some(node.clone());
            Ok(Mutation::UpdateNode(node))
        })?;
        updated.ok_or_else(|| SocialFlowError::Other("update produced no node".into()))
    }

    /// Delete a node and every edge touching it.
    pub fn remove_node(&self, id: &str) -> Result<Node> {
        let mut removed = None;
        self.mutate(|g| {
            let node = g.node(id).ok_or_else(|| SocialFlowError::node_not_found(id))?;
            removed = Some(node.clone());
            Ok(Mutation::RemoveNode { id: id.to_string() })
        })?;
        removed.ok_or_else(|| SocialFlowError::Other("remove produced no node".into()))
    }

    /// Connect two existing nodes.
    pub fn add_edge(&self, source: &str, target: &str) -> Result<Edge> {
        let edge = Edge::new(source, target);
        self.mutate(|g| {
            require_endpoints(g, source, target)?;
            if edge.is_self_loop() {
                return Err(SocialFlowError::InvalidInput(format!(
                    "self-loop on '{source}' is not allowed"
                )));
            }
            if g.has_edge(source, target) {
                return Err(SocialFlowError::Conflict(format!(
                    "edge '{source}' -> '{target}' already exists"
                )));
            }
            Ok(Mutation::AddEdge(edge.clone()))
        })?;
        Ok(edge)
    }

    /// Disconnect two existing nodes. Returns whether an edge was removed;
    /// removing an absent edge is a successful no-op.
    pub fn remove_edge(&self, source: &str, target: &str) -> Result<bool> {
        self.mutate(|g| {
            require_endpoints(g, source, target)?;
            Ok(Mutation::RemoveEdge(Edge::new(source, target)))
        })
    }

    /// The single write path.
    ///
    /// `plan` validates against the current snapshot and describes the
    /// change. The writer lock is held from validation through the mirror
    /// step, so no other mutation can invalidate the plan in between.
    fn mutate(&self, plan: impl FnOnce(&GraphStore) -> Result<Mutation>) -> Result<bool> {
        let durable = self.writer.lock();
        let mutation = plan(&self.graph.read())?;

        durable.apply(&mutation, self.config.orientation)?;
        let changed = self.graph.write().apply(&mutation);

        debug!(op = mutation.kind(), changed, "applied mutation");
        Ok(changed)
    }
}

fn require_endpoints(g: &GraphStore, source: &str, target: &str) -> Result<()> {
    if !g.contains(source) {
        return Err(SocialFlowError::NotFound(format!(
            "source node '{source}' does not exist"
        )));
    }
    if !g.contains(target) {
        return Err(SocialFlowError::NotFound(format!(
            "target node '{target}' does not exist"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! The single description of a state change, applied to both stores.
//!
//! A [`Mutation`] is validated against the in-memory graph, committed to
//! SQLite in one transaction by [`DurableStore::apply`], and only then
//! mirrored into the [`GraphStore`] by [`GraphStore::apply`]. Because both
//! layers consume the same value they cannot disagree on what changed.
//!
//! [`DurableStore::apply`]: crate::db::store::DurableStore::apply
//! [`GraphStore`]: crate::graph::store::GraphStore
//! [`GraphStore::apply`]: crate::graph::store::GraphStore::apply

use serde::Serialize;

use crate::types::{Edge, Node};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    /// Insert a brand-new node with no edges.
    AddNode(Node),
    /// Replace label and attributes of an existing node.
    UpdateNode(Node),
    /// Delete a node and every edge touching it.
    RemoveNode { id: String },
    /// Insert one edge between two existing nodes.
    AddEdge(Edge),
    /// Delete one edge; a no-op if it is absent.
    RemoveEdge(Edge),
}

impl Mutation {
    /// Short name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddNode(_) => "add_node",
            Self::UpdateNode(_) => "update_node",
            Self::RemoveNode { .. } => "remove_node",
            Self::AddEdge(_) => "add_edge",
            Self::RemoveEdge(_) => "remove_edge",
        }
    }
}

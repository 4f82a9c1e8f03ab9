//! SQLite CRUD layer, the durable half of the graph.
//!
//! Uses `rusqlite` with `prepare_cached` for automatic statement caching.
//! Every mutation runs inside its own transaction so multi-row changes such
//! as a cascading node removal either land completely or not at all.

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::converters::{row_to_edge, row_to_node, EDGE_COLUMNS, NODE_COLUMNS};
use crate::db::schema::initialize_database;
use crate::error::{Result, SocialFlowError};
use crate::graph::mutation::Mutation;
use crate::types::{Edge, Node, Orientation};

// ---------------------------------------------------------------------------
// SQL constants
// ---------------------------------------------------------------------------

const INSERT_NODE_SQL: &str = "\
INSERT INTO nodes (id, label, attributes) VALUES (?1, ?2, ?3)";

const UPDATE_NODE_SQL: &str = "\
UPDATE nodes SET label = ?2, attributes = ?3 WHERE id = ?1";

const DELETE_NODE_EDGES_SQL: &str = "\
DELETE FROM edges WHERE source_id = ?1 OR target_id = ?1";

const DELETE_NODE_SQL: &str = "\
DELETE FROM nodes WHERE id = ?1";

const INSERT_EDGE_SQL: &str = "\
INSERT INTO edges (source_id, target_id, weight) VALUES (?1, ?2, 1)";

const DELETE_EDGE_SQL: &str = "\
DELETE FROM edges WHERE source_id = ?1 AND target_id = ?2";

const DELETE_EDGE_EITHER_WAY_SQL: &str = "\
DELETE FROM edges
WHERE (source_id = ?1 AND target_id = ?2)
   OR (source_id = ?2 AND target_id = ?1)";

// ---------------------------------------------------------------------------
// DurableStore
// ---------------------------------------------------------------------------

/// Typed wrapper around the SQLite database holding `nodes` and `edges`.
pub struct DurableStore {
    conn: Connection,
}

impl std::fmt::Debug for DurableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableStore").finish_non_exhaustive()
    }
}

impl DurableStore {
    /// Open (or create) the database at `db_path` and apply the schema.
    pub fn open(db_path: &str) -> Result<Self> {
        let conn = initialize_database(db_path)?;
        Ok(Self { conn })
    }

    /// Borrow the raw connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Close the connection, surfacing any error SQLite reports on close.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| SocialFlowError::Storage(e))
    }

    // -------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------

    /// Commit `mutation` in a single transaction.
    ///
    /// Nothing is validated here beyond what the schema enforces; callers
    /// check existence and conflicts against the in-memory graph first.
    pub fn apply(&self, mutation: &Mutation, orientation: Orientation) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        match mutation {
            Mutation::AddNode(node) => {
                let mut stmt = tx.prepare_cached(INSERT_NODE_SQL)?;
                stmt.execute(params![node.id, node.label, node.attributes.to_json()?])?;
            }
            Mutation::UpdateNode(node) => {
                let mut stmt = tx.prepare_cached(UPDATE_NODE_SQL)?;
                let changed =
                    stmt.execute(params![node.id, node.label, node.attributes.to_json()?])?;
                if changed == 0 {
                    return Err(SocialFlowError::node_not_found(&node.id));
                }
            }
            Mutation::RemoveNode { id } => {
                // Edges first: they reference the node via FK.
                let mut del_edges = tx.prepare_cached(DELETE_NODE_EDGES_SQL)?;
                del_edges.execute(params![id])?;
                let mut del_node = tx.prepare_cached(DELETE_NODE_SQL)?;
                del_node.execute(params![id])?;
            }
            Mutation::AddEdge(edge) => {
                let mut stmt = tx.prepare_cached(INSERT_EDGE_SQL)?;
                stmt.execute(params![edge.source, edge.target])?;
            }
            Mutation::RemoveEdge(edge) => {
                let sql = match orientation {
                    Orientation::Undirected => DELETE_EDGE_EITHER_WAY_SQL,
                    Orientation::Directed => DELETE_EDGE_SQL,
                };
                let mut stmt = tx.prepare_cached(sql)?;
                stmt.execute(params![edge.source, edge.target])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Delete the exact `source → target` rows listed, in one transaction.
    /// Returns the number of rows removed.
    pub fn purge_edges(&self, rows: &[Edge]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut removed = 0;
        {
            let mut stmt = tx.prepare_cached(DELETE_EDGE_SQL)?;
            for edge in rows {
                removed += stmt.execute(params![edge.source, edge.target])?;
            }
        }
        tx.commit()?;
        Ok(removed)
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    /// Retrieve a single node by id, or `None` if it doesn't exist.
    pub fn get_node(&self, id: &str) -> Result<Option<Node>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = ?1"))?;
        let mut rows = stmt.query_and_then(params![id], row_to_node)?;
        rows.next().transpose()
    }

    /// Whether the exact ordered row `source → target` is stored.
    pub fn has_edge_row(&self, source: &str, target: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT 1 FROM edges WHERE source_id = ?1 AND target_id = ?2")?;
        let found: Option<i64> = stmt
            .query_row(params![source, target], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    /// Every node row, in id order.
    pub fn load_nodes(&self) -> Result<Vec<Node>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("SELECT {NODE_COLUMNS} FROM nodes ORDER BY id"))?;
        let rows = stmt.query_and_then([], row_to_node)?;
        rows.collect()
    }

    /// Every edge row, in insertion order.
    pub fn load_edges(&self) -> Result<Vec<Edge>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("SELECT {EDGE_COLUMNS} FROM edges ORDER BY rowid"))?;
        let rows = stmt.query_and_then([], row_to_edge)?;
        rows.collect()
    }

    pub fn node_count(&self) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached("SELECT count(*) FROM nodes")?;
        let count: i64 = stmt.query_row([], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn edge_count(&self) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached("SELECT count(*) FROM edges")?;
        let count: i64 = stmt.query_row([], |row| row.get(0))?;
        Ok(count as usize)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Attributes;
    use serde_json::json;

    fn setup() -> DurableStore {
        DurableStore::open(":memory:").expect("schema init should succeed on :memory:")
    }

    fn node(id: &str) -> Node {
        Node::new(id, Some(&id.to_uppercase()), Attributes::new())
    }

    fn add(store: &DurableStore, m: Mutation) {
        store.apply(&m, Orientation::Directed).unwrap();
    }

    #[test]
    fn add_and_get_node_round_trip() {
        let store = setup();
        let attrs = Attributes::new()
            .with("techStack", json!(["Go", "Redis"]))
            .with("tier", "middleware");
        let n = Node::new("svc_limiter", Some("Rate-Limiter"), attrs.clone());
        add(&store, Mutation::AddNode(n));

        let got = store.get_node("svc_limiter").unwrap().expect("node should exist");
        assert_eq!(got.label, "Rate-Limiter");
        assert_eq!(got.attributes, attrs);
    }

    #[test]
    fn get_node_returns_none_for_missing_id() {
        let store = setup();
        assert!(store.get_node("nope").unwrap().is_none());
    }

    #[test]
    fn duplicate_node_insert_fails() {
        let store = setup();
        add(&store, Mutation::AddNode(node("a")));
        let err = store
            .apply(&Mutation::AddNode(node("a")), Orientation::Directed)
            .unwrap_err();
        assert!(matches!(err, SocialFlowError::Storage(_)));
        assert_eq!(store.node_count().unwrap(), 1);
    }

    #[test]
    fn update_missing_node_is_not_found() {
        let store = setup();
        let err = store
            .apply(&Mutation::UpdateNode(node("ghost")), Orientation::Directed)
            .unwrap_err();
        assert!(matches!(err, SocialFlowError::NotFound(_)));
    }

    #[test]
    fn update_replaces_label_and_attributes() {
        let store = setup();
        add(&store, Mutation::AddNode(node("a")));
        let updated = Node::new("a", Some("Alpha"), Attributes::new().with("tier", "core"));
        add(&store, Mutation::UpdateNode(updated.clone()));
        assert_eq!(store.get_node("a").unwrap(), Some(updated));
    }

    #[test]
    fn remove_node_cascades_edges_in_both_directions() {
        let store = setup();
        for id in ["a", "b", "c"] {
            add(&store, Mutation::AddNode(node(id)));
        }
        add(&store, Mutation::AddEdge(Edge::new("a", "b")));
        add(&store, Mutation::AddEdge(Edge::new("b", "c")));
        add(&store, Mutation::AddEdge(Edge::new("c", "a")));

        add(&store, Mutation::RemoveNode { id: "b".into() });

        assert_eq!(store.node_count().unwrap(), 2);
        assert_eq!(store.load_edges().unwrap(), vec![Edge::new("c", "a")]);
    }

    #[test]
    fn undirected_edge_removal_matches_either_row_orientation() {
        let store = setup();
        add(&store, Mutation::AddNode(node("a")));
        add(&store, Mutation::AddNode(node("b")));
        add(&store, Mutation::AddEdge(Edge::new("a", "b")));

        store
            .apply(&Mutation::RemoveEdge(Edge::new("b", "a")), Orientation::Undirected)
            .unwrap();
        assert_eq!(store.edge_count().unwrap(), 0);
    }

    #[test]
    fn directed_edge_removal_is_exact() {
        let store = setup();
        add(&store, Mutation::AddNode(node("a")));
        add(&store, Mutation::AddNode(node("b")));
        add(&store, Mutation::AddEdge(Edge::new("a", "b")));

        add(&store, Mutation::RemoveEdge(Edge::new("b", "a")));
        assert!(store.has_edge_row("a", "b").unwrap());

        add(&store, Mutation::RemoveEdge(Edge::new("a", "b")));
        assert!(!store.has_edge_row("a", "b").unwrap());
    }

    #[test]
    fn edge_to_missing_node_violates_foreign_key() {
        let store = setup();
        add(&store, Mutation::AddNode(node("a")));
        let err = store
            .apply(&Mutation::AddEdge(Edge::new("a", "ghost")), Orientation::Directed)
            .unwrap_err();
        assert!(matches!(err, SocialFlowError::Storage(_)));
        assert_eq!(store.edge_count().unwrap(), 0);
    }

    #[test]
    fn load_nodes_is_ordered_by_id() {
        let store = setup();
        for id in ["c", "a", "b"] {
            add(&store, Mutation::AddNode(node(id)));
        }
        let ids: Vec<String> = store.load_nodes().unwrap().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn purge_removes_only_listed_rows() {
        let store = setup();
        for id in ["a", "b"] {
            add(&store, Mutation::AddNode(node(id)));
        }
        add(&store, Mutation::AddEdge(Edge::new("a", "b")));
        add(&store, Mutation::AddEdge(Edge::new("b", "a")));

        let removed = store
            .purge_edges(&[Edge::new("b", "a"), Edge::new("a", "ghost")])
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.load_edges().unwrap(), vec![Edge::new("a", "b")]);
    }

    #[test]
    fn malformed_attribute_json_loads_as_empty_bag() {
        let store = setup();
        store
            .connection()
            .execute(
                "INSERT INTO nodes (id, label, attributes) VALUES ('a', 'A', '{broken')",
                [],
            )
            .unwrap();
        let nodes = store.load_nodes().unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].label, "A");
        assert!(nodes[0].attributes.is_empty());
    }

    #[test]
    fn close_succeeds() {
        let store = setup();
        store.close().unwrap();
    }
}

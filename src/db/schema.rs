//! SQLite schema initialization.
//!
//! Two tables: `nodes` holds the node records with their attribute bag as
//! JSON text, `edges` holds unit-weight relationships with a uniqueness
//! constraint on the ordered pair and foreign keys into `nodes`.

use rusqlite::Connection;

// ---------------------------------------------------------------------------
// DDL constants
// ---------------------------------------------------------------------------

const CREATE_NODES: &str = "\
CREATE TABLE IF NOT EXISTS nodes (
  id TEXT PRIMARY KEY,
  label TEXT NOT NULL,
  attributes TEXT NOT NULL DEFAULT '{}'
)";

const CREATE_EDGES: &str = "\
CREATE TABLE IF NOT EXISTS edges (
  source_id TEXT NOT NULL,
  target_id TEXT NOT NULL,
  weight REAL NOT NULL DEFAULT 1,
  PRIMARY KEY (source_id, target_id),
  FOREIGN KEY (source_id) REFERENCES nodes(id),
  FOREIGN KEY (target_id) REFERENCES nodes(id)
)";

const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source_id)",
    "CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target_id)",
];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Open (or create) the SQLite database at `db_path` and apply the schema.
///
/// The returned connection has WAL mode, foreign keys, and synchronous
/// NORMAL configured. `":memory:"` opens a private in-memory database.
///
/// # Errors
///
/// Returns a `rusqlite::Error` if the database cannot be opened or any DDL
/// statement fails.
pub fn initialize_database(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    apply_schema(&conn)?;
    Ok(conn)
}

/// Apply pragmas and DDL to an already-open connection. Idempotent.
pub fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    // In-memory databases stay in "memory" journal mode.
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;

    conn.execute_batch(CREATE_NODES)?;
    conn.execute_batch(CREATE_EDGES)?;
    for ddl in CREATE_INDEXES {
        conn.execute_batch(ddl)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<String>, _>>()
            .unwrap()
    }

    #[test]
    fn creates_both_tables() {
        let conn = initialize_database(":memory:").unwrap();
        assert_eq!(table_names(&conn), vec!["edges", "nodes"]);
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = initialize_database(":memory:").unwrap();
        apply_schema(&conn).unwrap();
        apply_schema(&conn).unwrap();
        assert_eq!(table_names(&conn).len(), 2);
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let conn = initialize_database(":memory:").unwrap();
        let err = conn.execute(
            "INSERT INTO edges (source_id, target_id) VALUES ('ghost', 'phantom')",
            [],
        );
        assert!(err.is_err(), "dangling edge rows must be rejected");
    }

    #[test]
    fn duplicate_edge_pair_is_rejected() {
        let conn = initialize_database(":memory:").unwrap();
        conn.execute_batch(
            "INSERT INTO nodes (id, label) VALUES ('a', 'A'), ('b', 'B');
             INSERT INTO edges (source_id, target_id) VALUES ('a', 'b');",
        )
        .unwrap();
        let dup = conn.execute("INSERT INTO edges (source_id, target_id) VALUES ('a', 'b')", []);
        assert!(dup.is_err());
    }

    #[test]
    fn attributes_default_to_empty_object() {
        let conn = initialize_database(":memory:").unwrap();
        conn.execute("INSERT INTO nodes (id, label) VALUES ('a', 'A')", [])
            .unwrap();
        let attrs: String = conn
            .query_row("SELECT attributes FROM nodes WHERE id = 'a'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(attrs, "{}");
    }
}

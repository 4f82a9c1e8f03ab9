//! Row → domain type conversions for the `nodes` and `edges` tables.

use rusqlite::Row;
use tracing::warn;

use crate::error::Result;
use crate::types::{normalize_label, Attributes, Edge, Node, UNKNOWN_LABEL};

/// Columns selected by every node query, in the order [`row_to_node`] reads them.
pub const NODE_COLUMNS: &str = "id, label, attributes";

/// Columns selected by every edge query, in the order [`row_to_edge`] reads them.
pub const EDGE_COLUMNS: &str = "source_id, target_id";

/// Convert a `nodes` row into a [`Node`].
///
/// A blank stored label loads as [`UNKNOWN_LABEL`]. Attribute text that is
/// not valid JSON loads as an empty bag with a warning.
pub fn row_to_node(row: &Row<'_>) -> Result<Node> {
    let id: String = row.get(0)?;
    let label: Option<String> = row.get(1)?;
    let raw: Option<String> = row.get(2)?;

    let attributes = match Attributes::from_json(raw.as_deref()) {
        Ok(attributes) => attributes,
        Err(e) => {
            warn!(node = %id, error = %e, "malformed attributes, loading as empty");
            Attributes::new()
        }
    };

    Ok(Node {
        label: normalize_label(label.as_deref()).unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
        id,
        attributes,
    })
}

/// Convert an `edges` row into an [`Edge`].
pub fn row_to_edge(row: &Row<'_>) -> Result<Edge> {
    Ok(Edge {
        source: row.get(0)?,
        target: row.get(1)?,
    })
}

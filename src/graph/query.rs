//! Read-side projections: overview stats, node search, the capped
//! visualization graph, and single-node detail.
//!
//! Everything here is computed from the current [`GraphStore`] snapshot on
//! each call; nothing is cached.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::graph::similarity::round_to;
use crate::graph::store::GraphStore;
use crate::types::{Attributes, Node, Orientation};

/// Default number of nodes in a graph projection.
pub const DEFAULT_GRAPH_LIMIT: usize = 600;

/// Default search page size.
pub const DEFAULT_PAGE_SIZE: usize = 50;

// ---------------------------------------------------------------------------
// Overview
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub orientation: Orientation,
    pub total_nodes: usize,
    pub total_edges: usize,
    pub isolated_nodes: usize,
    /// Edges over the maximum possible for the orientation, 4 decimals.
    pub network_density: f64,
}

pub fn overview(store: &GraphStore) -> Overview {
    let nodes = store.node_count();
    let edges = store.edge_count();
    let max = store.orientation().max_edges(nodes);
    let density = if max == 0 {
        0.0
    } else {
        round_to(edges as f64 / max as f64, 4)
    };

    Overview {
        orientation: store.orientation(),
        total_nodes: nodes,
        total_edges: edges,
        isolated_nodes: store.isolated_count(),
        network_density: density,
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Degree,
    /// Natural (numeric-aware) identifier order.
    Id,
    /// Tier ranking; unranked nodes always sort last.
    Tier,
}

impl SortKey {
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "degree" => Some(Self::Degree),
            "id" | "uid" => Some(Self::Id),
            "tier" => Some(Self::Tier),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    #[default]
    Desc,
}

impl SortDir {
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Asc),
            "desc" | "descending" => Some(Self::Desc),
            _ => None,
        }
    }

    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            Self::Asc => ord,
            Self::Desc => ord.reverse(),
        }
    }
}

/// Search request. `page` is 1-based; zero is treated as the first page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub query: Option<String>,
    pub page: usize,
    pub page_size: usize,
    pub sort_by: SortKey,
    pub sort_dir: SortDir,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            query: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: SortKey::default(),
            sort_dir: SortDir::default(),
        }
    }
}

/// A node annotated with its current degree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSummary {
    pub id: String,
    pub label: String,
    pub attributes: Attributes,
    pub degree: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_degree: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_degree: Option<usize>,
}

fn summarize(store: &GraphStore, node: &Node) -> NodeSummary {
    let degree = store.degree(&node.id);
    NodeSummary {
        id: node.id.clone(),
        label: node.label.clone(),
        attributes: node.attributes.clone(),
        degree: degree.total,
        in_degree: degree.in_degree,
        out_degree: degree.out_degree,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    /// Matches before pagination.
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub items: Vec<NodeSummary>,
}

/// Filter, sort, and paginate the node set.
///
/// The filter is a case-insensitive substring match against id and label.
/// Ties under any sort key fall back to natural id order.
pub fn search(store: &GraphStore, params: &SearchParams) -> SearchPage {
    let needle = params
        .query
        .as_deref()
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    let mut matches: Vec<(&Node, usize)> = store
        .nodes()
        .filter(|n| match &needle {
            None => true,
            Some(q) => n.id.to_lowercase().contains(q) || n.label.to_lowercase().contains(q),
        })
        .map(|n| (n, store.degree(&n.id).total))
        .collect();

    matches.sort_by(|(a, da), (b, db)| {
        let primary = match params.sort_by {
            SortKey::Degree => params.sort_dir.apply(da.cmp(db)),
            SortKey::Id => params.sort_dir.apply(natural_cmp(&a.id, &b.id)),
            SortKey::Tier => match (a.attributes.tier(), b.attributes.tier()) {
                (Some(x), Some(y)) => params.sort_dir.apply(x.rank().cmp(&y.rank())),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };
        primary.then_with(|| natural_cmp(&a.id, &b.id))
    });

    let page = params.page.max(1);
    let page_size = params.page_size.max(1);
    let items = matches
        .iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .map(|(n, _)| summarize(store, n))
        .collect();

    SearchPage {
        total: matches.len(),
        page,
        page_size,
        items,
    }
}

/// Case-insensitive comparison where runs of ASCII digits compare by value,
/// so `user2 < user10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut xs = a.chars().peekable();
    let mut ys = b.chars().peekable();
    loop {
        match (xs.peek().copied(), ys.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let left = take_digits(&mut xs);
                let right = take_digits(&mut ys);
                let l = left.trim_start_matches('0');
                let r = right.trim_start_matches('0');
                let ord = l.len().cmp(&r.len()).then_with(|| l.cmp(r));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = x.to_lowercase().cmp(y.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                xs.next();
                ys.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        run.push(c);
    }
    run
}

// ---------------------------------------------------------------------------
// Graph projection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedEdge {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

/// Nodes and edges for a visualization client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphProjection {
    pub nodes: Vec<Node>,
    pub edges: Vec<ProjectedEdge>,
}

/// The first `limit` nodes in id order plus every edge between them.
/// Undirected edges appear once.
pub fn project(store: &GraphStore, limit: usize) -> GraphProjection {
    let ids: Vec<&str> = store.sorted_ids().into_iter().take(limit).collect();
    let keep: std::collections::HashSet<&str> = ids.iter().copied().collect();

    let nodes = ids
        .iter()
        .filter_map(|id| store.node(id).cloned())
        .collect();
    let edges = store
        .edges()
        .into_iter()
        .filter(|e| keep.contains(e.source.as_str()) && keep.contains(e.target.as_str()))
        .map(|e| ProjectedEdge {
            source: e.source,
            target: e.target,
            weight: 1.0,
        })
        .collect();

    GraphProjection { nodes, edges }
}

// ---------------------------------------------------------------------------
// Node detail
// ---------------------------------------------------------------------------

pub fn detail(store: &GraphStore, id: &str) -> Option<NodeSummary> {
    store.node(id).map(|n| summarize(store, n))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

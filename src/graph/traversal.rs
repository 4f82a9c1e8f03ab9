//! Breadth-first traversals over the in-memory graph.
//!
//! Shortest path walks outbound adjacency, blast radius walks inbound
//! adjacency, and the neighbor listings expand one or two hops. None of
//! these touch SQLite.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use crate::error::{Result, SocialFlowError};
use crate::graph::store::GraphStore;
use crate::types::Orientation;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// One hop of a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathStep {
    pub id: String,
    pub label: String,
}

/// Shortest path between two nodes. An unreachable destination is reported
/// as `distance == -1` with an empty path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathResult {
    pub distance: i64,
    pub path: Vec<PathStep>,
}

impl PathResult {
    pub fn unreachable() -> Self {
        Self {
            distance: -1,
            path: Vec::new(),
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.distance >= 0
    }

    pub fn ids(&self) -> Vec<&str> {
        self.path.iter().map(|s| s.id.as_str()).collect()
    }
}

/// A node that transitively depends on the blast-radius target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpactedNode {
    pub id: String,
    pub label: String,
    /// Inbound hops from the target (1 = direct caller).
    pub hops: u32,
    /// Callees this node shares with the target.
    pub shared_dependencies: usize,
}

/// Everything upstream of a failing node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpactReport {
    pub target: String,
    pub total_affected: usize,
    pub affected: Vec<ImpactedNode>,
}

/// A direct neighbor with its current degree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeighborEntry {
    pub id: String,
    pub label: String,
    pub degree: usize,
}

/// A first-degree friend, carrying its list attribute (e.g. interests).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FriendEntry {
    pub id: String,
    pub label: String,
    pub degree: usize,
    pub tags: Vec<String>,
}

/// A friend-of-friend and how many friends it shares with the origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecondDegreeEntry {
    pub id: String,
    pub label: String,
    pub degree: usize,
    pub mutual: usize,
}

/// Neighborhood around a node, shaped by orientation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "orientation", rename_all = "lowercase")]
pub enum NeighborListing {
    Undirected {
        first_degree: Vec<FriendEntry>,
        second_degree: Vec<SecondDegreeEntry>,
    },
    Directed {
        /// Callers of the node.
        upstream: Vec<NeighborEntry>,
        /// Callees of the node.
        downstream: Vec<NeighborEntry>,
    },
}

// ---------------------------------------------------------------------------
// GraphTraversal
// ---------------------------------------------------------------------------

/// Traversal algorithms bound to one graph snapshot.
pub struct GraphTraversal<'a> {
    store: &'a GraphStore,
}

impl<'a> GraphTraversal<'a> {
    /// Create a new traversal bound to the given store.
    pub fn new(store: &'a GraphStore) -> Self {
        Self { store }
    }

    fn require(&self, id: &str) -> Result<()> {
        if self.store.contains(id) {
            Ok(())
        } else {
            Err(SocialFlowError::node_not_found(id))
        }
    }

    fn step(&self, id: &str) -> PathStep {
        PathStep {
            id: id.to_string(),
            label: self.store.label_of(id).to_string(),
        }
    }

    // -------------------------------------------------------------------
    // shortest_path
    // -------------------------------------------------------------------

    /// Unweighted shortest path from `from` to `to` along outbound edges.
    ///
    /// Both ids must exist. Among equally short paths the one returned
    /// depends on neighbor-set iteration order.
    pub fn shortest_path(&self, from: &str, to: &str) -> Result<PathResult> {
        self.require(from)?;
        self.require(to)?;

        if from == to {
            return Ok(PathResult {
                distance: 0,
                path: vec![self.step(from)],
            });
        }

        let mut parent: HashMap<&str, &str> = HashMap::new();
        let mut visited: HashSet<&str> = HashSet::from([from]);
        let mut queue: VecDeque<&str> = VecDeque::from([from]);

        while let Some(current) = queue.pop_front() {
            let Some(neighbors) = self.store.outbound(current) else {
                continue;
            };
            for next in neighbors {
                let next = next.as_str();
                if next == to {
                    let mut ids = vec![to, current];
                    let mut cursor = current;
                    while let Some(&p) = parent.get(cursor) {
                        ids.push(p);
                        cursor = p;
                    }
                    ids.reverse();
                    return Ok(PathResult {
                        distance: (ids.len() - 1) as i64,
                        path: ids.into_iter().map(|id| self.step(id)).collect(),
                    });
                }
                if visited.insert(next) {
                    parent.insert(next, current);
                    queue.push_back(next);
                }
            }
        }

        Ok(PathResult::unreachable())
    }

    // -------------------------------------------------------------------
    // blast_radius
    // -------------------------------------------------------------------

    /// Every node that reaches `target` over inbound edges, i.e. everything
    /// that breaks transitively if `target` fails.
    ///
    /// Results are ordered by descending shared-dependency count, then by
    /// hop distance and id. Only defined for directed graphs.
    pub fn blast_radius(&self, target: &str) -> Result<ImpactReport> {
        if !self.store.orientation().is_directed() {
            return Err(SocialFlowError::InvalidInput(
                "blast radius requires a directed graph".into(),
            ));
        }
        self.require(target)?;

        let empty = HashSet::new();
        let target_deps = self.store.outbound(target).unwrap_or(&empty);

        let mut visited: HashSet<&str> = HashSet::from([target]);
        let mut queue: VecDeque<(&str, u32)> = VecDeque::from([(target, 0)]);
        let mut affected = Vec::new();

        while let Some((current, hops)) = queue.pop_front() {
            let Some(callers) = self.store.inbound(current) else {
                continue;
            };
            for caller in callers {
                let caller = caller.as_str();
                if !visited.insert(caller) {
                    continue;
                }
                let shared = self
                    .store
                    .outbound(caller)
                    .map_or(0, |deps| deps.intersection(target_deps).count());
                affected.push(ImpactedNode {
                    id: caller.to_string(),
                    label: self.store.label_of(caller).to_string(),
                    hops: hops + 1,
                    shared_dependencies: shared,
                });
                queue.push_back((caller, hops + 1));
            }
        }

        affected.sort_by(|a, b| {
            b.shared_dependencies
                .cmp(&a.shared_dependencies)
                .then(a.hops.cmp(&b.hops))
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(ImpactReport {
            target: target.to_string(),
            total_affected: affected.len(),
            affected,
        })
    }

    // -------------------------------------------------------------------
    // neighbors
    // -------------------------------------------------------------------

    /// Direct neighborhood of `id`.
    ///
    /// Directed graphs list callers and callees. Undirected graphs list
    /// friends (with the `tag_key` list attribute) and friends-of-friends
    /// with their mutual-friend count.
    pub fn neighbors(&self, id: &str, tag_key: &str) -> Result<NeighborListing> {
        self.require(id)?;
        match self.store.orientation() {
            Orientation::Directed => Ok(NeighborListing::Directed {
                upstream: self.entries(self.store.inbound(id)),
                downstream: self.entries(self.store.outbound(id)),
            }),
            Orientation::Undirected => Ok(NeighborListing::Undirected {
                first_degree: self.first_degree(id, tag_key),
                second_degree: self.second_degree(id),
            }),
        }
    }

    fn entries(&self, ids: Option<&HashSet<String>>) -> Vec<NeighborEntry> {
        let mut out: Vec<NeighborEntry> = ids
            .into_iter()
            .flatten()
            .map(|n| NeighborEntry {
                id: n.clone(),
                label: self.store.label_of(n).to_string(),
                degree: self.store.degree(n).total,
            })
            .collect();
        out.sort_by(|a, b| b.degree.cmp(&a.degree).then_with(|| a.id.cmp(&b.id)));
        out
    }

    fn first_degree(&self, id: &str, tag_key: &str) -> Vec<FriendEntry> {
        let mut out: Vec<FriendEntry> = self
            .store
            .outbound(id)
            .into_iter()
            .flatten()
            .map(|f| FriendEntry {
                id: f.clone(),
                label: self.store.label_of(f).to_string(),
                degree: self.store.degree(f).total,
                tags: self
                    .store
                    .node(f)
                    .map(|n| n.attributes.list(tag_key).into_iter().map(String::from).collect())
                    .unwrap_or_default(),
            })
            .collect();
        out.sort_by(|a, b| b.degree.cmp(&a.degree).then_with(|| a.id.cmp(&b.id)));
        out
    }

    fn second_degree(&self, id: &str) -> Vec<SecondDegreeEntry> {
        let empty = HashSet::new();
        let friends = self.store.outbound(id).unwrap_or(&empty);
        let mut seen: HashSet<&str> = friends.iter().map(String::as_str).collect();
        seen.insert(id);

        let mut out = Vec::new();
        for friend in friends {
            for fof in self.store.outbound(friend).into_iter().flatten() {
                if !seen.insert(fof.as_str()) {
                    continue;
                }
                let mutual = self
                    .store
                    .outbound(fof)
                    .map_or(0, |theirs| theirs.intersection(friends).count());
                out.push(SecondDegreeEntry {
                    id: fof.clone(),
                    label: self.store.label_of(fof).to_string(),
                    degree: self.store.degree(fof).total,
                    mutual,
                });
            }
        }
        out.sort_by(|a, b| b.mutual.cmp(&a.mutual).then_with(|| a.id.cmp(&b.id)));
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

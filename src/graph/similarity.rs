//! Friend-of-friend / common-dependency recommendations.
//!
//! Candidates are the nodes two hops away. Each is scored by the Jaccard
//! coefficient of its neighbor set against the origin's, plus a bonus for
//! overlap in a list attribute (interests, or tech stack).

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::graph::store::GraphStore;
use crate::types::Orientation;

/// Weight of the attribute-overlap bonus relative to the Jaccard score.
pub const ATTRIBUTE_BONUS_WEIGHT: f64 = 0.2;

/// A ranked suggestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub id: String,
    pub label: String,
    pub score: f64,
    /// `score` as a percentage, rounded to two decimals.
    pub match_rate: f64,
    /// Number of the origin's neighbors this candidate also connects to.
    pub shared: usize,
    pub jaccard: f64,
    pub bonus: f64,
    pub reason: String,
}

/// Top-`limit` recommendations for `id`, best first.
///
/// An unknown node, a node without neighbors, or `limit == 0` yields an
/// empty list. In directed graphs the origin's neighbors are its callees
/// and the candidates are the other callers of those callees. Equal scores
/// are ordered by id.
pub fn recommend(store: &GraphStore, id: &str, limit: usize, list_key: &str) -> Vec<Recommendation> {
    let Some(origin) = store.node(id) else {
        return Vec::new();
    };
    let mine = match store.outbound(id) {
        Some(set) if !set.is_empty() => set,
        _ => return Vec::new(),
    };

    let mut intersections: HashMap<&str, usize> = HashMap::new();
    for neighbor in mine {
        let second_hop = match store.orientation() {
            Orientation::Undirected => store.outbound(neighbor),
            Orientation::Directed => store.inbound(neighbor),
        };
        for candidate in second_hop.into_iter().flatten() {
            if candidate == id || mine.contains(candidate) {
                continue;
            }
            *intersections.entry(candidate.as_str()).or_insert(0) += 1;
        }
    }

    let my_tags = origin.attributes.list(list_key);
    let mut scored: Vec<Recommendation> = intersections
        .into_iter()
        .filter_map(|(candidate, shared)| {
            let node = store.node(candidate)?;
            let theirs = store.outbound(candidate).map_or(0, HashSet::len);
            let union = mine.len() + theirs - shared;
            let jaccard = if union == 0 {
                0.0
            } else {
                shared as f64 / union as f64
            };
            let bonus = attribute_bonus(&my_tags, &node.attributes.list(list_key));
            let score = jaccard + bonus;
            Some(Recommendation {
                id: candidate.to_string(),
                label: node.label.clone(),
                score,
                match_rate: round_to(score * 100.0, 2),
                shared,
                jaccard,
                bonus,
                reason: reason(store.orientation(), shared, bonus),
            })
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
    scored.truncate(limit);
    scored
}

/// Shared-element ratio of two tag lists scaled by [`ATTRIBUTE_BONUS_WEIGHT`].
/// Zero when either list is empty.
pub fn attribute_bonus(mine: &[&str], theirs: &[&str]) -> f64 {
    if mine.is_empty() || theirs.is_empty() {
        return 0.0;
    }
    let theirs_set: HashSet<&str> = theirs.iter().copied().collect();
    let shared = mine.iter().filter(|t| theirs_set.contains(*t)).count();
    shared as f64 / mine.len().max(theirs.len()) as f64 * ATTRIBUTE_BONUS_WEIGHT
}

fn reason(orientation: Orientation, shared: usize, bonus: f64) -> String {
    let mut text = match orientation {
        Orientation::Undirected => format!("{shared} mutual friend(s)"),
        Orientation::Directed => format!("{shared} shared dependenc(ies)"),
    };
    if bonus > 0.0 {
        text.push_str(match orientation {
            Orientation::Undirected => ", strong interest overlap",
            Orientation::Directed => ", similar tech stack",
        });
    }
    text
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

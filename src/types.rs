//! Core domain types: nodes, edges, orientation, and the attribute bag.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Label given to nodes created or loaded without a usable name.
pub const UNKNOWN_LABEL: &str = "Unknown";

// ---------------------------------------------------------------------------
// Orientation
// ---------------------------------------------------------------------------

/// Whether edges are symmetric friendships or source→target dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Social graph: an edge A–B is visible from both endpoints.
    #[default]
    Undirected,
    /// Dependency graph: an edge A→B means "A calls B".
    Directed,
}

impl Orientation {
    /// Parse leniently, accepting the domain aliases as well.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "undirected" | "social" | "symmetric" => Some(Self::Undirected),
            "directed" | "dependency" | "dependencies" | "services" => Some(Self::Directed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Undirected => "undirected",
            Self::Directed => "directed",
        }
    }

    pub fn is_directed(&self) -> bool {
        matches!(self, Self::Directed)
    }

    /// Attribute key whose list value feeds the recommendation bonus.
    pub fn default_similarity_key(&self) -> &'static str {
        match self {
            Self::Undirected => "interests",
            Self::Directed => "techStack",
        }
    }

    /// Largest number of distinct edges a graph of `n` nodes can hold.
    pub fn max_edges(&self, n: usize) -> usize {
        if n < 2 {
            return 0;
        }
        match self {
            Self::Undirected => n * (n - 1) / 2,
            Self::Directed => n * (n - 1),
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tier
// ---------------------------------------------------------------------------

/// Architectural layer of a service node, in ranking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Gateway,
    Bff,
    Core,
    Middleware,
    Auxiliary,
    Data,
    Ops,
}

impl Tier {
    /// Case-insensitive parse. The Chinese layer names written by older
    /// databases are accepted as aliases.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gateway" | "网关层" => Some(Self::Gateway),
            "bff" | "bff层" => Some(Self::Bff),
            "core" | "核心链路" => Some(Self::Core),
            "middleware" | "中间件" => Some(Self::Middleware),
            "auxiliary" | "aux" | "旁路服务" => Some(Self::Auxiliary),
            "data" | "数据层" => Some(Self::Data),
            "ops" | "operations" | "运维平台" => Some(Self::Ops),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gateway => "gateway",
            Self::Bff => "bff",
            Self::Core => "core",
            Self::Middleware => "middleware",
            Self::Auxiliary => "auxiliary",
            Self::Data => "data",
            Self::Ops => "ops",
        }
    }

    /// Sort priority; lower ranks first.
    pub fn rank(&self) -> u8 {
        *self as u8
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// Open attribute bag attached to every node.
///
/// Stored as JSON text in the `nodes.attributes` column. Keys are kept in
/// sorted order so the serialized form is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, Value>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// String elements of a list-valued attribute. Non-string elements and
    /// non-list values yield nothing.
    pub fn list(&self, key: &str) -> Vec<&str> {
        match self.0.get(key) {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// The `tier` attribute, if present and recognised.
    pub fn tier(&self) -> Option<Tier> {
        self.0
            .get("tier")
            .and_then(Value::as_str)
            .and_then(Tier::from_str_loose)
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse the stored column; `NULL`, empty text and non-object JSON all
    /// load as an empty bag.
    pub fn from_json(text: Option<&str>) -> crate::error::Result<Self> {
        match text.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(raw) => match serde_json::from_str::<Value>(raw)? {
                Value::Object(map) => Ok(Self(map.into_iter().collect())),
                _ => Ok(Self::default()),
            },
        }
    }
}

impl From<BTreeMap<String, Value>> for Attributes {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

// ---------------------------------------------------------------------------
// Node / Edge
// ---------------------------------------------------------------------------

/// An entity in the graph: a person or a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub attributes: Attributes,
}

impl Node {
    /// Build a node, substituting [`UNKNOWN_LABEL`] for a blank label.
    pub fn new(id: impl Into<String>, label: Option<&str>, attributes: Attributes) -> Self {
        Self {
            id: id.into(),
            label: normalize_label(label).unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
            attributes,
        }
    }
}

/// A relationship between two nodes. For undirected graphs the order of
/// `source` and `target` carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Trimmed label, or `None` when it is absent or blank.
pub fn normalize_label(label: Option<&str>) -> Option<String> {
    label
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case("social", Some(Orientation::Undirected))]
    #[test_case("Directed", Some(Orientation::Directed))]
    #[test_case(" dependency ", Some(Orientation::Directed))]
    #[test_case("sideways", None)]
    fn orientation_loose_parsing(input: &str, expected: Option<Orientation>) {
        assert_eq!(Orientation::from_str_loose(input), expected);
    }

    #[test]
    fn max_edges_per_orientation() {
        assert_eq!(Orientation::Undirected.max_edges(4), 6);
        assert_eq!(Orientation::Directed.max_edges(4), 12);
        assert_eq!(Orientation::Directed.max_edges(1), 0);
        assert_eq!(Orientation::Undirected.max_edges(0), 0);
    }

    #[test]
    fn tier_ranking_follows_layering() {
        assert!(Tier::Gateway.rank() < Tier::Bff.rank());
        assert!(Tier::Core.rank() < Tier::Data.rank());
        assert!(Tier::Data.rank() < Tier::Ops.rank());
        assert_eq!(Tier::from_str_loose("MIDDLEWARE"), Some(Tier::Middleware));
        assert_eq!(Tier::from_str_loose("edge"), None);
    }

    #[test_case("网关层", Tier::Gateway)]
    #[test_case("BFF层", Tier::Bff)]
    #[test_case("核心链路", Tier::Core)]
    #[test_case("中间件", Tier::Middleware)]
    #[test_case("旁路服务", Tier::Auxiliary)]
    #[test_case(" 数据层 ", Tier::Data)]
    #[test_case("运维平台", Tier::Ops)]
    fn tier_accepts_legacy_layer_names(raw: &str, expected: Tier) {
        assert_eq!(Tier::from_str_loose(raw), Some(expected));
    }

    #[test]
    fn attributes_list_ignores_non_strings() {
        let attrs = Attributes::new().with("interests", json!(["chess", 7, "go"]));
        assert_eq!(attrs.list("interests"), vec!["chess", "go"]);
        assert!(attrs.list("missing").is_empty());
    }

    #[test]
    fn attributes_tier_parses_known_values() {
        let attrs = Attributes::new().with("tier", "data");
        assert_eq!(attrs.tier(), Some(Tier::Data));
        let attrs = Attributes::new().with("tier", 3);
        assert_eq!(attrs.tier(), None);
    }

    #[test]
    fn attributes_json_round_trip_is_sorted() {
        let attrs = Attributes::new()
            .with("tier", "core")
            .with("techStack", json!(["Go"]));
        let text = attrs.to_json().unwrap();
        assert_eq!(text, r#"{"techStack":["Go"],"tier":"core"}"#);
        assert_eq!(Attributes::from_json(Some(&text)).unwrap(), attrs);
    }

    #[test]
    fn attributes_from_blank_or_non_object_is_empty() {
        assert!(Attributes::from_json(None).unwrap().is_empty());
        assert!(Attributes::from_json(Some("  ")).unwrap().is_empty());
        assert!(Attributes::from_json(Some("[1,2]")).unwrap().is_empty());
        assert!(Attributes::from_json(Some("{broken")).is_err());
    }

    #[test]
    fn node_blank_label_uses_placeholder() {
        assert_eq!(Node::new("u1", Some("   "), Attributes::new()).label, UNKNOWN_LABEL);
        assert_eq!(Node::new("u1", None, Attributes::new()).label, UNKNOWN_LABEL);
        assert_eq!(Node::new("u1", Some(" Ada "), Attributes::new()).label, "Ada");
    }
}

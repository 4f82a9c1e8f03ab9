//! Configuration data structures for the SocialFlow engine.
//!
//! Defines the YAML config format: database location, graph orientation,
//! query limits, and the optional write token checked by the request
//! boundary.

use serde::{Deserialize, Serialize};

use crate::graph::query::{DEFAULT_GRAPH_LIMIT, DEFAULT_PAGE_SIZE};
use crate::types::Orientation;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration.
///
/// Loaded from a YAML file, environment variables, and CLI flags, merged
/// by [`crate::config::load_config`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// SQLite database path, or `:memory:`.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Whether edges are friendships or call dependencies.
    #[serde(default)]
    pub orientation: Orientation,

    /// Attribute whose list value feeds the recommendation bonus. Defaults
    /// per orientation (`interests` / `techStack`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_key: Option<String>,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            orientation: Orientation::default(),
            similarity_key: None,
            limits: LimitsConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl EngineConfig {
    /// An in-memory configuration, handy for tests and throwaway graphs.
    pub fn in_memory(orientation: Orientation) -> Self {
        Self {
            db_path: ":memory:".to_string(),
            orientation,
            ..Self::default()
        }
    }

    /// The effective recommendation attribute key.
    pub fn similarity_key(&self) -> &str {
        self.similarity_key
            .as_deref()
            .unwrap_or_else(|| self.orientation.default_similarity_key())
    }
}

// ---------------------------------------------------------------------------
// LimitsConfig
// ---------------------------------------------------------------------------

/// Default sizes for read operations when the caller supplies none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Node cap for the visualization projection.
    #[serde(default = "default_graph_limit")]
    pub graph_limit: usize,

    /// Recommendations returned when no `top_k` is given.
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Search page size when none is given.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            graph_limit: default_graph_limit(),
            default_top_k: default_top_k(),
            page_size: default_page_size(),
        }
    }
}

// ---------------------------------------------------------------------------
// AuthConfig
// ---------------------------------------------------------------------------

/// Write protection. When `write_token` is set, mutating requests must carry
/// `Bearer <token>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_token: Option<String>,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_db_path() -> String {
    directories::ProjectDirs::from("", "", "socialflow")
        .map(|dirs| dirs.data_dir().join("socialflow.db"))
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "socialflow.db".to_string())
}

fn default_graph_limit() -> usize {
    DEFAULT_GRAPH_LIMIT
}

fn default_top_k() -> usize {
    6
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.orientation, Orientation::Undirected);
        assert_eq!(config.limits.graph_limit, 600);
        assert_eq!(config.limits.default_top_k, 6);
        assert_eq!(config.limits.page_size, 50);
        assert!(config.db_path.ends_with("socialflow.db"));
        assert!(config.auth.write_token.is_none());
    }

    #[test]
    fn test_similarity_key_follows_orientation() {
        assert_eq!(EngineConfig::in_memory(Orientation::Undirected).similarity_key(), "interests");
        assert_eq!(EngineConfig::in_memory(Orientation::Directed).similarity_key(), "techStack");

        let mut config = EngineConfig::in_memory(Orientation::Directed);
        config.similarity_key = Some("languages".into());
        assert_eq!(config.similarity_key(), "languages");
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "orientation: directed\nlimits:\n  default_top_k: 3\n";
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.orientation, Orientation::Directed);
        assert_eq!(config.limits.default_top_k, 3);
        assert_eq!(config.limits.graph_limit, 600);
    }

    #[test]
    fn test_full_yaml_config() {
        let yaml = r#"
db_path: /var/lib/socialflow/graph.db
orientation: undirected
similarity_key: hobbies
limits:
  graph_limit: 100
  default_top_k: 10
  page_size: 20
auth:
  write_token: s3cret
"#;
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.db_path, "/var/lib/socialflow/graph.db");
        assert_eq!(config.similarity_key(), "hobbies");
        assert_eq!(config.limits.page_size, 20);
        assert_eq!(config.auth.write_token.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_serde_yaml_roundtrip() {
        let config = EngineConfig::in_memory(Orientation::Directed);
        let yaml = serde_yaml::to_string(&config).unwrap();
        let back: EngineConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_invalid_orientation_is_an_error() {
        let result: Result<EngineConfig, _> = serde_yaml::from_str("orientation: sideways");
        assert!(result.is_err());
    }
}

//! Command-line interface.
//!
//! Every subcommand maps onto one [`Request`] (or a maintenance action) and
//! prints the resulting [`ApiResponse`] as pretty JSON.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use crate::api::{AllowAll, Api, ApiResponse, Request, StaticToken};
use crate::config::{load_config, ConfigOverrides, EngineConfig};
use crate::engine::GraphEngine;
use crate::error::{Result, SocialFlowError};
use crate::graph::query::{SearchParams, SortDir, SortKey};
use crate::seed::{self, Dataset};
use crate::types::{Attributes, Orientation};

#[derive(Parser, Debug)]
#[command(name = "socialflow")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Relationship graph engine: paths, blast radius and recommendations over SQLite")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// YAML config file (default: ./socialflow.yaml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database path, overrides config and SOCIALFLOW_DB
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Graph orientation: undirected (social) or directed (services)
    #[arg(long, global = true, value_parser = parse_orientation)]
    pub orientation: Option<Orientation>,

    /// Bearer token presented for write commands
    #[arg(long, global = true, env = "SOCIALFLOW_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the database schema and report the (possibly empty) graph
    Init,
    /// Load a built-in dataset
    Seed {
        /// services | social
        #[arg(value_parser = parse_dataset)]
        dataset: Dataset,
    },
    /// Node/edge counts and density
    Overview,
    /// Nodes and edges for rendering
    Graph {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// One node with its degree
    Detail { id: String },
    /// Neighbor listing (friends / callers and callees)
    Neighbors { id: String },
    /// Shortest path between two nodes
    Path { from: String, to: String },
    /// Everything that depends on a node, transitively (directed only)
    Impact { id: String },
    /// Friend-of-friend or co-dependency recommendations
    Recommend {
        id: String,
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Filtered, sorted, paginated node listing
    Search {
        #[arg(long)]
        q: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, value_parser = parse_sort_key, default_value = "degree")]
        sort_by: SortKey,
        #[arg(long, value_parser = parse_sort_dir, default_value = "desc")]
        sort_dir: SortDir,
    },
    AddNode {
        id: String,
        #[arg(long)]
        label: Option<String>,
        /// Attribute object as JSON
        #[arg(long, value_parser = parse_attributes)]
        attrs: Option<Attributes>,
    },
    UpdateNode {
        id: String,
        #[arg(long)]
        label: Option<String>,
        /// Replacement attribute object as JSON
        #[arg(long, value_parser = parse_attributes)]
        attrs: Option<Attributes>,
    },
    RemoveNode { id: String },
    AddEdge { from: String, to: String },
    RemoveEdge { from: String, to: String },
}

impl Command {
    /// The boundary request this command issues, if any.
    pub fn to_request(&self, page_size: usize) -> Option<Request> {
        let req = match self.clone() {
            Self::Init | Self::Seed { .. } => return None,
            Self::Overview => Request::Overview,
            Self::Graph { limit } => Request::Graph { limit },
            Self::Detail { id } => Request::NodeDetail { id },
            Self::Neighbors { id } => Request::Neighbors { id },
            Self::Path { from, to } => Request::ShortestPath { from, to },
            Self::Impact { id } => Request::BlastRadius { id },
            Self::Recommend { id, top_k } => Request::Recommend { id, top_k },
            Self::Search {
                q,
                page,
                limit,
                sort_by,
                sort_dir,
            } => Request::Search(SearchParams {
                query: q,
                page,
                page_size: limit.unwrap_or(page_size),
                sort_by,
                sort_dir,
            }),
            Self::AddNode { id, label, attrs } => Request::AddNode {
                id,
                label,
                attributes: attrs.unwrap_or_default(),
            },
            Self::UpdateNode { id, label, attrs } => Request::UpdateNode {
                id,
                label,
                attributes: attrs,
            },
            Self::RemoveNode { id } => Request::RemoveNode { id },
            Self::AddEdge { from, to } => Request::AddEdge {
                source: from,
                target: to,
            },
            Self::RemoveEdge { from, to } => Request::RemoveEdge {
                source: from,
                target: to,
            },
        };
        Some(req)
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Resolve configuration for `global`.
pub fn resolve_config(global: &GlobalOptions) -> Result<EngineConfig> {
    let overrides = ConfigOverrides {
        db_path: global.db.clone(),
        orientation: global.orientation,
        write_token: None,
    };
    load_config(global.config.as_deref(), &overrides)
}

/// Run one command against a freshly opened engine.
pub fn run(cli: &Cli) -> Result<ApiResponse<Value>> {
    let config = resolve_config(&cli.global)?;
    let engine = GraphEngine::open(config)?;
    let response = execute(&engine, &cli.command, cli.global.token.as_deref());
    engine.shutdown()?;
    response
}

/// Execute `command` on an open engine.
pub fn execute(
    engine: &GraphEngine,
    command: &Command,
    token: Option<&str>,
) -> Result<ApiResponse<Value>> {
    match command {
        Command::Init => Ok(ApiResponse::ok(serde_json::to_value(engine.overview())?)),
        Command::Seed { dataset } => {
            Ok(ApiResponse::ok(serde_json::to_value(seed::load(engine, *dataset)?)?))
        }
        other => {
            let request = other
                .to_request(engine.config().limits.page_size)
                .ok_or_else(|| SocialFlowError::Other("command has no request form".into()))?;
            let credential = token.map(|t| format!("Bearer {t}"));
            let response = match &engine.config().auth.write_token {
                Some(expected) => Api::new(engine, StaticToken::new(expected.clone()))
                    .dispatch(request, credential.as_deref()),
                None => Api::new(engine, AllowAll).dispatch(request, credential.as_deref()),
            };
            Ok(response)
        }
    }
}

// ---------------------------------------------------------------------------
// Value parsers
// ---------------------------------------------------------------------------

fn parse_orientation(s: &str) -> std::result::Result<Orientation, String> {
    Orientation::from_str_loose(s).ok_or_else(|| format!("unknown orientation '{s}'"))
}

fn parse_dataset(s: &str) -> std::result::Result<Dataset, String> {
    Dataset::from_str_loose(s).ok_or_else(|| format!("unknown dataset '{s}' (services | social)"))
}

fn parse_sort_key(s: &str) -> std::result::Result<SortKey, String> {
    SortKey::from_str_loose(s).ok_or_else(|| format!("unknown sort key '{s}' (degree | id | tier)"))
}

fn parse_sort_dir(s: &str) -> std::result::Result<SortDir, String> {
    SortDir::from_str_loose(s).ok_or_else(|| format!("unknown sort direction '{s}' (asc | desc)"))
}

fn parse_attributes(s: &str) -> std::result::Result<Attributes, String> {
    let value: Value = serde_json::from_str(s).map_err(|e| format!("invalid JSON: {e}"))?;
    if !value.is_object() {
        return Err("attributes must be a JSON object".to_string());
    }
    serde_json::from_value(value).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("socialflow").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_anywhere() {
        let cli = parse(&["path", "a", "b", "--db", "x.db", "--orientation", "services"]);
        assert_eq!(cli.global.db.as_deref(), Some("x.db"));
        assert_eq!(cli.global.orientation, Some(Orientation::Directed));
        assert!(matches!(cli.command, Command::Path { .. }));
    }

    #[test]
    fn search_defaults() {
        let cli = parse(&["search", "--q", "svc"]);
        match cli.command.to_request(50) {
            Some(Request::Search(p)) => {
                assert_eq!(p.query.as_deref(), Some("svc"));
                assert_eq!(p.page, 1);
                assert_eq!(p.page_size, 50);
                assert_eq!(p.sort_by, SortKey::Degree);
                assert_eq!(p.sort_dir, SortDir::Desc);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_values() {
        let bad = |args: &[&str]| {
            Cli::try_parse_from(std::iter::once("socialflow").chain(args.iter().copied())).is_err()
        };
        assert!(bad(&["seed", "nope"]));
        assert!(bad(&["--orientation", "sideways", "overview"]));
        assert!(bad(&["add-node", "a", "--attrs", "[1,2]"]));
        assert!(bad(&["search", "--sort-by", "size"]));
    }

    #[test]
    fn add_node_attrs_parse() {
        let cli = parse(&["add-node", "u1", "--label", "Alice", "--attrs", r#"{"interests":["go"]}"#]);
        match cli.command.to_request(50) {
            Some(Request::AddNode { attributes, .. }) => {
                assert_eq!(attributes.list("interests"), vec!["go"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn execute_honours_configured_write_token() {
        let mut config = EngineConfig::in_memory(Orientation::Undirected);
        config.auth.write_token = Some("t0k".into());
        let engine = GraphEngine::open(config).unwrap();
        let add = Command::AddNode {
            id: "a".into(),
            label: None,
            attrs: None,
        };

        let denied = execute(&engine, &add, None).unwrap();
        assert_eq!(denied.code, 401);
        let ok = execute(&engine, &add, Some("t0k")).unwrap();
        assert_eq!(ok.code, 200);
        let read = execute(&engine, &Command::Overview, None).unwrap();
        assert_eq!(read.data.unwrap()["total_nodes"], 1);
    }

    #[test]
    fn seed_then_impact() {
        let engine = GraphEngine::in_memory(Orientation::Directed).unwrap();
        let seeded = execute(
            &engine,
            &Command::Seed {
                dataset: Dataset::Services,
            },
            None,
        )
        .unwrap();
        assert!(seeded.is_ok());
        let impact = execute(&engine, &Command::Impact { id: "db_log".into() }, None).unwrap();
        assert_eq!(impact.code, 200);
        assert!(impact.data.unwrap()["total_affected"].as_u64().unwrap() > 0);
    }
}

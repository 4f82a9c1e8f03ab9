//! SocialFlow: an in-memory relationship graph engine.
//!
//! Keeps a social network (undirected friendships) or a service topology
//! (directed call dependencies) in memory for fast traversal, with SQLite as
//! the durable system of record. Provides shortest path, blast radius,
//! Jaccard-based recommendations and paginated search.

pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod graph;
pub mod observability;
pub mod seed;
pub mod types;

pub use engine::GraphEngine;
pub use error::{Result, SocialFlowError};
pub use types::{Attributes, Edge, Node, Orientation, Tier};

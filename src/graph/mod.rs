//! Graph layer: in-memory adjacency store, traversal, ranking and queries.

pub mod mutation;
pub mod query;
pub mod similarity;
pub mod store;
pub mod traversal;

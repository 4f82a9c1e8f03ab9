//! Durable store: the SQLite system of record.

pub mod converters;
pub mod schema;
pub mod store;

//! Error types for the SocialFlow graph engine.

use thiserror::Error;

/// Every failure the engine, its stores, and the request boundary can report.
///
/// `InvalidInput`, `NotFound` and `Conflict` are caller errors and never
/// leave the stores diverged. `Storage` aborts a mutation before the
/// in-memory graph is touched.
#[derive(Debug, Error)]
pub enum SocialFlowError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<serde_yaml::Error> for SocialFlowError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Config(e.to_string())
    }
}

impl SocialFlowError {
    /// Shorthand for a `NotFound` naming a missing node.
    pub fn node_not_found(id: &str) -> Self {
        Self::NotFound(format!("node '{id}' does not exist"))
    }
}

pub type Result<T> = std::result::Result<T, SocialFlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_not_found_names_the_id() {
        let err = SocialFlowError::node_not_found("svc_pay");
        assert_eq!(err.to_string(), "not found: node 'svc_pay' does not exist");
    }

    #[test]
    fn yaml_errors_become_config_errors() {
        let yaml_err = serde_yaml::from_str::<Vec<u32>>("{ not: a list").unwrap_err();
        let err: SocialFlowError = yaml_err.into();
        assert!(matches!(err, SocialFlowError::Config(_)));
    }
}

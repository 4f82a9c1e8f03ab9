//! Engine configuration: YAML schema plus layered loading.

pub mod loader;
pub mod schema;

pub use loader::{load_config, ConfigOverrides};
pub use schema::{AuthConfig, EngineConfig, LimitsConfig};

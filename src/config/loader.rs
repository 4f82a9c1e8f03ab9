//! Layered config loading: CLI overrides > environment > YAML file > defaults.

use std::path::Path;

use crate::config::schema::EngineConfig;
use crate::error::{Result, SocialFlowError};
use crate::types::Orientation;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "socialflow.yaml";

pub const ENV_DB: &str = "SOCIALFLOW_DB";
pub const ENV_ORIENTATION: &str = "SOCIALFLOW_ORIENTATION";

/// Values supplied on the command line; they win over every other source.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub db_path: Option<String>,
    pub orientation: Option<Orientation>,
    pub write_token: Option<String>,
}

/// Load the effective configuration.
///
/// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_FILE`] is
/// used if present and defaults otherwise.
pub fn load_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<EngineConfig> {
    let mut config = match path {
        Some(p) => read_file(p)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => read_file(Path::new(DEFAULT_CONFIG_FILE))?,
        None => EngineConfig::default(),
    };
    apply_env(&mut config, |key| std::env::var(key).ok())?;
    apply_overrides(&mut config, overrides);
    Ok(config)
}

fn read_file(path: &Path) -> Result<EngineConfig> {
    let text = std::fs::read_to_string(path)?;
    let config = serde_yaml::from_str(&text)?;
    tracing::debug!("loaded config from {}", path.display());
    Ok(config)
}

/// Apply environment variables, read through `lookup`.
pub fn apply_env(
    config: &mut EngineConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(db) = lookup(ENV_DB).filter(|v| !v.trim().is_empty()) {
        config.db_path = db;
    }
    if let Some(raw) = lookup(ENV_ORIENTATION) {
        config.orientation = Orientation::from_str_loose(&raw).ok_or_else(|| {
            SocialFlowError::Config(format!("{ENV_ORIENTATION}: unknown orientation '{raw}'"))
        })?;
    }
    Ok(())
}

pub fn apply_overrides(config: &mut EngineConfig, overrides: &ConfigOverrides) {
    if let Some(db) = &overrides.db_path {
        config.db_path = db.clone();
    }
    if let Some(orientation) = overrides.orientation {
        config.orientation = orientation;
    }
    if let Some(token) = &overrides.write_token {
        config.auth.write_token = Some(token.clone());
    }
}

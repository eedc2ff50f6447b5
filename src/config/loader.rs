//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Why a configuration file could not become a usable [`GatewayConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("configuration rejected: {}", list_problems(.0))]
    Validation(Vec<ValidationError>),
}

fn list_problems(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Load, parse, and semantically validate a TOML configuration file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = toml::from_str(&fs::read_to_string(path)?)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

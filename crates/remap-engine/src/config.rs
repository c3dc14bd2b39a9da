//! Mapper configuration
//!
//! Settings shared by every mapping call of a [`Mapper`](crate::Mapper),
//! loadable from a TOML document:
//!
//! ```toml
//! default_max_depth = 8
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Depth limit applied when no rule supplies one
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Errors that can occur while loading a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read mapper config: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse mapper config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid mapper config: {0}")]
    ValidationError(String),
}

/// Mapper-wide settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MapperConfig {
    /// Maximum nesting depth of one mapping call, counting the top-level
    /// object as depth 1
    pub default_max_depth: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            default_max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl MapperConfig {
    /// Parse a configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse a configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: MapperConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_max_depth == 0 {
            return Err(ConfigError::ValidationError(
                "default_max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

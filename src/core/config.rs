/// Engine configuration, loadable from RON.
///
/// ```ron
/// (
///     max_depth: 32,
///     start_category: "root",
/// )
/// ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub const DEFAULT_MAX_DEPTH: usize = 64;
pub const DEFAULT_MAX_EXPANSIONS: usize = 1_000_000;
pub const DEFAULT_START_CATEGORY: &str = "root";

/// Limits and defaults used by the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deepest allowed nesting of category expansions.
    pub max_depth: usize,
    /// Total category expansions allowed per generation.
    pub max_expansions: usize,
    /// Category expanded when the caller does not name one.
    pub start_category: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_expansions: DEFAULT_MAX_EXPANSIONS,
            start_category: DEFAULT_START_CATEGORY.to_string(),
        }
    }
}

impl EngineConfig {
    /// Load a config from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<EngineConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a config from a RON string. Missing fields take their defaults.
    pub fn parse_ron(input: &str) -> Result<EngineConfig, ConfigError> {
        let config: EngineConfig = ron::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid("max_depth must be at least 1".to_string()));
        }
        if self.max_expansions == 0 {
            return Err(ConfigError::Invalid(
                "max_expansions must be at least 1".to_string(),
            ));
        }
        if self.start_category.is_empty() {
            return Err(ConfigError::Invalid(
                "start_category must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_depth, 64);
        assert_eq!(config.start_category, "root");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_partial_ron() {
        let config = EngineConfig::parse_ron("(max_depth: 8)").unwrap();
        assert_eq!(config.max_depth, 8);
        assert_eq!(config.max_expansions, DEFAULT_MAX_EXPANSIONS);
        assert_eq!(config.start_category, "root");
    }

    #[test]
    fn reject_zero_depth() {
        assert!(matches!(
            EngineConfig::parse_ron("(max_depth: 0)"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn reject_malformed_ron() {
        assert!(matches!(
            EngineConfig::parse_ron("(max_depth: \"deep\")"),
            Err(ConfigError::Ron(_))
        ));
    }

    #[test]
    fn load_fixture() {
        let path = std::path::PathBuf::from("tests/fixtures/engine.ron");
        let config = EngineConfig::load_from_ron(&path).unwrap();
        assert_eq!(config.max_depth, 16);
        assert_eq!(config.start_category, "scene");
    }

    #[test]
    fn ron_round_trip() {
        let config = EngineConfig {
            max_depth: 5,
            max_expansions: 99,
            start_category: "poem".to_string(),
        };
        let serialized = ron::to_string(&config).unwrap();
        assert_eq!(EngineConfig::parse_ron(&serialized).unwrap(), config);
    }
}

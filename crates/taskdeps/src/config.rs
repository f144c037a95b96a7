//! Configuration for the dependency graph engine.
//!
//! Configuration lives in `.taskdeps/config.yaml`:
//!
//! ```yaml
//! cache-ttl-secs: 3600
//! cache-prefix: task_dependencies
//! strategy: auto
//! database: .taskdeps/tasks.db
//! ```
//!
//! Every key is optional; missing keys take the defaults below.

use crate::engine::StrategyPreference;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Default lifetime of a cached query result (one hour)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Default namespace prefix for cache keys
pub const DEFAULT_CACHE_PREFIX: &str = "task_dependencies";

/// Default database location, relative to the project root
pub const DEFAULT_DATABASE_PATH: &str = ".taskdeps/tasks.db";

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default)]
pub struct GraphConfig {
    /// Seconds a cached traversal or completion result may be served
    pub cache_ttl_secs: u64,

    /// Prefix for every cache key (`{prefix}:{namespace}:{task}`)
    pub cache_prefix: String,

    /// Which traversal strategy to use
    pub strategy: StrategyPreference,

    /// SQLite database file used by the CLI
    pub database: PathBuf,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
            strategy: StrategyPreference::Auto,
            database: PathBuf::from(DEFAULT_DATABASE_PATH),
        }
    }
}

impl GraphConfig {
    /// Load and validate configuration from a YAML file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| Error::Validation(format!("invalid config {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::Validation(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the TTL is zero or the prefix is empty
    /// or contains the `:` key separator.
    pub fn validate(&self) -> Result<()> {
        if self.cache_ttl_secs == 0 {
            return Err(Error::Validation(
                "cache-ttl-secs must be greater than zero".to_string(),
            ));
        }
        if self.cache_prefix.trim().is_empty() {
            return Err(Error::Validation("cache-prefix cannot be empty".to_string()));
        }
        if self.cache_prefix.contains(':') {
            return Err(Error::Validation(
                "cache-prefix cannot contain ':'".to_string(),
            ));
        }
        Ok(())
    }

    /// The cache TTL as a [`Duration`]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = GraphConfig::default();
        assert_eq!(config.cache_ttl_secs, 3600);
        assert_eq!(config.cache_prefix, "task_dependencies");
        assert_eq!(config.strategy, StrategyPreference::Auto);
        assert_eq!(config.cache_ttl(), Duration::from_secs(3600));
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");

        let config = GraphConfig {
            cache_ttl_secs: 60,
            strategy: StrategyPreference::Iterative,
            ..Default::default()
        };
        config.save(&path).await.unwrap();

        let loaded = GraphConfig::load(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_config_partial_yaml_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, "strategy: recursive\n").unwrap();

        let loaded = GraphConfig::load(&path).await.unwrap();
        assert_eq!(loaded.strategy, StrategyPreference::Recursive);
        assert_eq!(loaded.cache_ttl_secs, DEFAULT_CACHE_TTL_SECS);
        assert_eq!(loaded.cache_prefix, DEFAULT_CACHE_PREFIX);
    }

    #[rstest]
    #[case::zero_ttl("cache-ttl-secs: 0\n", "greater than zero")]
    #[case::empty_prefix("cache-prefix: \"\"\n", "cannot be empty")]
    #[case::separator_in_prefix("cache-prefix: \"a:b\"\n", "cannot contain")]
    #[case::bad_strategy("strategy: fastest\n", "invalid config")]
    #[tokio::test]
    async fn test_config_rejects_invalid(#[case] yaml: &str, #[case] expected: &str) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, yaml).unwrap();

        let err = GraphConfig::load(&path).await.unwrap_err();
        assert!(
            err.to_string().contains(expected),
            "Expected error to contain '{}', got: '{}'",
            expected,
            err
        );
    }
}

//! Configuration management for Hitwindow.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{HitwindowError, Result};
use crate::ratelimit::Algorithm;

/// Prefix for environment overrides, e.g. `HITWINDOW__STORE__URL`.
const ENV_PREFIX: &str = "HITWINDOW";

/// Main configuration for Hitwindow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HitwindowConfig {
    /// Counter store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Limiter configuration
    #[serde(default)]
    pub limiter: LimiterConfig,
}

/// Counter store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Redis connection URL
    #[serde(default = "default_store_url")]
    pub url: String,

    /// Namespace prepended to every limiter key
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_store_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_key_prefix() -> String {
    "hitwindow".to_string()
}

/// Limiter configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Algorithm used for every resource
    #[serde(default)]
    pub algorithm: Algorithm,
}

impl HitwindowConfig {
    /// Load configuration from an optional file, then apply `HITWINDOW__*`
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            info!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(config::File::from(path));
        }

        let config: HitwindowConfig = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .and_then(|raw| raw.try_deserialize())
            .map_err(|e| HitwindowError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: HitwindowConfig =
            serde_yaml::from_str(yaml).map_err(|e| HitwindowError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that cannot be expressed through serde defaults.
    pub fn validate(&self) -> Result<()> {
        if self.store.url.trim().is_empty() {
            return Err(HitwindowError::Config("store.url must not be empty".to_string()));
        }
        if self.store.key_prefix.trim().is_empty() {
            return Err(HitwindowError::Config(
                "store.key_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = HitwindowConfig::default();
        assert_eq!(config.store.url, "redis://127.0.0.1:6379");
        assert_eq!(config.store.key_prefix, "hitwindow");
        assert_eq!(config.limiter.algorithm, Algorithm::FixedWindow);
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
store:
  url: redis://cache:6380/2
limiter:
  algorithm: sliding_window
"#;
        let config = HitwindowConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.store.url, "redis://cache:6380/2");
        assert_eq!(config.store.key_prefix, "hitwindow");
        assert_eq!(config.limiter.algorithm, Algorithm::SlidingWindow);
    }

    #[test]
    fn test_from_yaml_rejects_unknown_algorithm() {
        let yaml = "limiter:\n  algorithm: token_bucket\n";
        assert!(matches!(
            HitwindowConfig::from_yaml(yaml),
            Err(HitwindowError::Config(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_url() {
        let yaml = "store:\n  url: \"\"\n";
        assert!(HitwindowConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("hitwindow-{}.yaml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "store:\n  key_prefix: app\nlimiter:\n  algorithm: sliding_window").unwrap();

        let config = HitwindowConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.store.key_prefix, "app");
        assert_eq!(config.limiter.algorithm, Algorithm::SlidingWindow);
    }
}

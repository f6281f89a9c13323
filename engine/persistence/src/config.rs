//! Configuration for the value store

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the value store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Base directory for persisted files
    pub data_dir: PathBuf,

    /// Maximum number of value snapshots to keep
    pub max_snapshots: usize,

    /// Write indented JSON
    pub pretty: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            max_snapshots: 24,
            pretty: true,
        }
    }
}

impl PersistenceConfig {
    /// Create a new configuration with custom data directory
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into(), ..Default::default() }
    }

    /// Directory holding the value snapshot files
    pub fn values_dir(&self) -> PathBuf {
        self.data_dir.join("values")
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_snapshots == 0 {
            return Err("max_snapshots must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PersistenceConfig::default();
        assert_eq!(config.max_snapshots, 24);
        assert!(config.pretty);
        assert!(config.validate().is_ok());
        assert_eq!(config.values_dir(), PathBuf::from("./data/values"));
    }

    #[test]
    fn test_zero_snapshots_rejected() {
        let config = PersistenceConfig { max_snapshots: 0, ..PersistenceConfig::new("/tmp/store") };
        assert!(config.validate().is_err());
    }
}

//! Local file-based value store construction

use crate::backend::LocalValuesStore;
use crate::config::PersistenceConfig;
use crate::error::Result;

/// Create a new local value store with default configuration
pub fn create_local_store(data_dir: impl Into<std::path::PathBuf>) -> Result<LocalValuesStore> {
    LocalValuesStore::with_default_config(data_dir)
}

/// Create a new local value store with custom configuration
pub fn create_local_store_with_config(config: PersistenceConfig) -> Result<LocalValuesStore> {
    LocalValuesStore::new(config)
}

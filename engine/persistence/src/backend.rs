//! Value store trait and implementations

use crate::config::PersistenceConfig;
use crate::error::{PersistenceError, Result};
use crate::snapshot::{SnapshotManager, ValueSnapshot};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Abstract trait for value storage backends
#[async_trait::async_trait]
pub trait ValuesStore: Send + Sync {
    /// Initialize the store
    async fn initialize(&mut self) -> Result<()>;

    /// Store one solve's values with the trades behind them.
    ///
    /// Fails with `KeyMismatch` before writing anything when the two maps
    /// are not keyed by the same items.
    async fn put_values(
        &self,
        values: &BTreeMap<String, f64>,
        trades: &BTreeMap<String, serde_json::Value>,
    ) -> Result<Uuid>;

    /// Load the most recent snapshot
    async fn load_latest(&self) -> Result<Option<ValueSnapshot>>;

    /// Load a specific snapshot by ID
    async fn load_by_id(&self, snapshot_id: Uuid) -> Result<Option<ValueSnapshot>>;

    /// Get the configuration
    fn config(&self) -> &PersistenceConfig;
}

/// Local file-based value store
pub struct LocalValuesStore {
    config: PersistenceConfig,
    snapshot_manager: SnapshotManager,
    initialized: bool,
}

impl LocalValuesStore {
    /// Create a new local value store
    pub fn new(config: PersistenceConfig) -> Result<Self> {
        config.validate().map_err(PersistenceError::config)?;

        let snapshot_manager = SnapshotManager::new(&config);
        Ok(Self { config, snapshot_manager, initialized: false })
    }

    /// Create a new local value store with default config
    pub fn with_default_config(data_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::new(PersistenceConfig::new(data_dir))
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.config.data_dir
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(PersistenceError::NotInitialized)
        }
    }
}

#[async_trait::async_trait]
impl ValuesStore for LocalValuesStore {
    async fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        tokio::fs::create_dir_all(self.snapshot_manager.values_dir()).await?;
        self.initialized = true;

        tracing::info!("Local value store initialized at: {:?}", self.config.data_dir);
        Ok(())
    }

    async fn put_values(
        &self,
        values: &BTreeMap<String, f64>,
        trades: &BTreeMap<String, serde_json::Value>,
    ) -> Result<Uuid> {
        self.ensure_initialized()?;

        let snapshot = ValueSnapshot::new(values, trades)?;
        self.snapshot_manager.store(&snapshot).await?;
        Ok(snapshot.id)
    }

    async fn load_latest(&self) -> Result<Option<ValueSnapshot>> {
        self.ensure_initialized()?;
        self.snapshot_manager.load_latest_snapshot().await
    }

    async fn load_by_id(&self, snapshot_id: Uuid) -> Result<Option<ValueSnapshot>> {
        self.ensure_initialized()?;
        self.snapshot_manager.load_snapshot_by_id(snapshot_id).await
    }

    fn config(&self) -> &PersistenceConfig {
        &self.config
    }
}

/// In-memory value store (for testing and dry runs)
pub struct InMemoryValuesStore {
    config: PersistenceConfig,
    snapshots: Arc<Mutex<HashMap<Uuid, ValueSnapshot>>>,
    initialized: bool,
}

impl InMemoryValuesStore {
    /// Create a new in-memory value store
    pub fn new(config: PersistenceConfig) -> Self {
        Self { config, snapshots: Arc::new(Mutex::new(HashMap::new())), initialized: false }
    }

    /// Create a new in-memory value store with default config
    pub fn with_default_config() -> Self {
        Self::new(PersistenceConfig::default())
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(PersistenceError::NotInitialized)
        }
    }
}

#[async_trait::async_trait]
impl ValuesStore for InMemoryValuesStore {
    async fn initialize(&mut self) -> Result<()> {
        self.initialized = true;
        tracing::info!("In-memory value store initialized");
        Ok(())
    }

    async fn put_values(
        &self,
        values: &BTreeMap<String, f64>,
        trades: &BTreeMap<String, serde_json::Value>,
    ) -> Result<Uuid> {
        self.ensure_initialized()?;

        let snapshot = ValueSnapshot::new(values, trades)?;
        let snapshot_id = snapshot.id;

        let mut snapshots = self.snapshots.lock().await;
        snapshots.insert(snapshot_id, snapshot);

        while snapshots.len() > self.config.max_snapshots {
            let oldest = snapshots.values().min_by_key(|s| s.created_at).map(|s| s.id);
            match oldest {
                Some(id) => snapshots.remove(&id),
                None => break,
            };
        }

        Ok(snapshot_id)
    }

    async fn load_latest(&self) -> Result<Option<ValueSnapshot>> {
        self.ensure_initialized()?;

        let snapshots = self.snapshots.lock().await;
        Ok(snapshots.values().max_by_key(|s| s.created_at).cloned())
    }

    async fn load_by_id(&self, snapshot_id: Uuid) -> Result<Option<ValueSnapshot>> {
        self.ensure_initialized()?;

        let snapshots = self.snapshots.lock().await;
        Ok(snapshots.get(&snapshot_id).cloned())
    }

    fn config(&self) -> &PersistenceConfig {
        &self.config
    }
}

//! Value snapshots
//!
//! Each successful solve is stored as one snapshot: the published value of
//! every item together with the trade list it was derived from.

use crate::config::PersistenceConfig;
use crate::error::{PersistenceError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Format of the human-readable `update_time` stamp
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Stored value of one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRecord {
    /// Published value
    pub value: f64,

    /// The item's trade list as exported
    pub trades: serde_json::Value,
}

/// All item values from one solve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueSnapshot {
    /// Unique identifier for this snapshot
    pub id: Uuid,

    /// Local wall-clock time of the update, formatted with [`TIME_FORMAT`]
    pub update_time: String,

    /// Timestamp when the snapshot was created
    pub created_at: DateTime<Utc>,

    /// Item name to stored value
    pub item_values: BTreeMap<String, ValueRecord>,
}

impl ValueSnapshot {
    /// Pair up `values` and `trades` into a new snapshot.
    ///
    /// Both maps must be keyed by exactly the same items.
    pub fn new(
        values: &BTreeMap<String, f64>,
        trades: &BTreeMap<String, serde_json::Value>,
    ) -> Result<Self> {
        let mismatched: Vec<String> = values
            .keys()
            .filter(|item| !trades.contains_key(*item))
            .chain(trades.keys().filter(|item| !values.contains_key(*item)))
            .cloned()
            .collect();
        if !mismatched.is_empty() {
            return Err(PersistenceError::KeyMismatch(mismatched));
        }

        let item_values = values
            .iter()
            .map(|(item, value)| {
                let trades = trades.get(item).cloned().unwrap_or(serde_json::Value::Null);
                (item.clone(), ValueRecord { value: *value, trades })
            })
            .collect();

        let created_at = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            update_time: chrono::Local::now().format(TIME_FORMAT).to_string(),
            created_at,
            item_values,
        })
    }

    pub fn value(&self, item: &str) -> Option<f64> {
        self.item_values.get(item).map(|record| record.value)
    }

    pub fn len(&self) -> usize {
        self.item_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_values.is_empty()
    }
}

/// Snapshot file information
#[derive(Debug, Clone)]
pub struct SnapshotFileInfo {
    /// File path
    pub path: PathBuf,

    /// Snapshot ID
    pub snapshot_id: Uuid,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Reads and writes value snapshot files in one directory
pub struct SnapshotManager {
    max_snapshots: usize,
    pretty: bool,
    values_dir: PathBuf,
}

impl SnapshotManager {
    /// Create a new snapshot manager
    pub fn new(config: &PersistenceConfig) -> Self {
        Self {
            max_snapshots: config.max_snapshots,
            pretty: config.pretty,
            values_dir: config.values_dir(),
        }
    }

    pub fn values_dir(&self) -> &Path {
        &self.values_dir
    }

    /// Write `snapshot` to disk, then prune the oldest files beyond the limit
    pub async fn store(&self, snapshot: &ValueSnapshot) -> Result<PathBuf> {
        let file_path = self.write_snapshot_file(snapshot)?;
        let file_size = std::fs::metadata(&file_path)?.len();

        tracing::info!(
            "Stored value snapshot {} ({} items, {} bytes)",
            snapshot.id,
            snapshot.len(),
            file_size
        );

        self.cleanup_old_snapshots().await?;
        Ok(file_path)
    }

    /// Load the most recently created snapshot
    pub async fn load_latest_snapshot(&self) -> Result<Option<ValueSnapshot>> {
        let snapshots = self.list_snapshots().await?;

        let Some(latest) = snapshots.last() else {
            tracing::info!("No value snapshots found in {:?}", self.values_dir);
            return Ok(None);
        };

        tracing::debug!(
            "Loading latest value snapshot {} from {:?}",
            latest.snapshot_id,
            latest.path
        );
        self.load_snapshot(&latest.path).map(Some)
    }

    /// Load a specific snapshot by ID
    pub async fn load_snapshot_by_id(&self, snapshot_id: Uuid) -> Result<Option<ValueSnapshot>> {
        let snapshots = self.list_snapshots().await?;

        match snapshots.iter().find(|info| info.snapshot_id == snapshot_id) {
            Some(info) => self.load_snapshot(&info.path).map(Some),
            None => Ok(None),
        }
    }

    /// All readable snapshots, oldest first
    pub async fn list_snapshots(&self) -> Result<Vec<SnapshotFileInfo>> {
        let mut snapshots = Vec::new();

        let entries = match std::fs::read_dir(&self.values_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(snapshots),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            let path = entry.path();

            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            match self.load_snapshot(&path) {
                Ok(snapshot) => snapshots.push(SnapshotFileInfo {
                    path,
                    snapshot_id: snapshot.id,
                    created_at: snapshot.created_at,
                }),
                Err(e) => tracing::warn!("Ignoring unreadable value snapshot {:?}: {}", path, e),
            }
        }

        snapshots.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.path.cmp(&b.path)));

        Ok(snapshots)
    }

    /// Remove the oldest snapshots beyond `max_snapshots`
    pub async fn cleanup_old_snapshots(&self) -> Result<()> {
        let snapshots = self.list_snapshots().await?;

        if snapshots.len() <= self.max_snapshots {
            return Ok(());
        }

        let snapshots_to_remove = snapshots.len() - self.max_snapshots;
        for snapshot in snapshots.iter().take(snapshots_to_remove) {
            std::fs::remove_file(&snapshot.path)?;
            tracing::debug!("Removed old value snapshot: {:?}", snapshot.path);
        }

        tracing::info!("Removed {} old value snapshots", snapshots_to_remove);
        Ok(())
    }

    fn write_snapshot_file(&self, snapshot: &ValueSnapshot) -> Result<PathBuf> {
        let filename = format!(
            "values_{}_{}.json",
            snapshot.created_at.format("%Y%m%dT%H%M%S%.6f"),
            snapshot.id
        );
        let file_path = self.values_dir.join(filename);

        let file = OpenOptions::new().create(true).write(true).truncate(true).open(&file_path)?;
        let mut writer = BufWriter::new(file);

        if self.pretty {
            serde_json::to_writer_pretty(&mut writer, snapshot)?;
        } else {
            serde_json::to_writer(&mut writer, snapshot)?;
        }

        writer.flush()?;
        Ok(file_path)
    }

    fn load_snapshot(&self, path: &Path) -> Result<ValueSnapshot> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values() -> BTreeMap<String, f64> {
        BTreeMap::from([("Perfect Amethyst".to_string(), 1.0), ("Ist Rune".to_string(), 3.0)])
    }

    fn trades() -> BTreeMap<String, serde_json::Value> {
        BTreeMap::from([
            ("Perfect Amethyst".to_string(), json!([[3, [[[1, "Ist Rune"]]]]])),
            ("Ist Rune".to_string(), json!([])),
        ])
    }

    #[test]
    fn test_snapshot_pairs_values_with_trades() {
        let snapshot = ValueSnapshot::new(&values(), &trades()).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.value("Ist Rune"), Some(3.0));
        assert_eq!(snapshot.item_values["Ist Rune"].trades, json!([]));
        assert!(chrono::NaiveDateTime::parse_from_str(&snapshot.update_time, TIME_FORMAT).is_ok());
    }

    #[test]
    fn test_mismatched_keys_are_reported() {
        let mut trades = trades();
        trades.remove("Ist Rune");
        trades.insert("Ber Rune".to_string(), json!([]));

        match ValueSnapshot::new(&values(), &trades) {
            Err(PersistenceError::KeyMismatch(items)) => {
                assert_eq!(items, vec!["Ist Rune".to_string(), "Ber Rune".to_string()]);
            }
            other => panic!("expected key mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = ValueSnapshot::new(&values(), &trades()).unwrap();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["item_values"]["Ist Rune"]["value"], json!(3.0));
        assert!(json["update_time"].is_string());
    }
}

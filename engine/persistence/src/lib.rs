//! # Persistence Layer
//!
//! Storage for published item values. Every solve is kept as one value
//! snapshot pairing each item's value with the trades it was derived from.
//!
//! ## Architecture
//!
//! - **ValuesStore**: Abstract trait for different storage backends
//! - **LocalValuesStore**: One JSON file per snapshot with bounded retention
//! - **InMemoryValuesStore**: Process-local store for tests and dry runs
//!
//! ## Usage
//!
//! ```rust
//! use persistence::{create_local_store, ValuesStore};
//! use std::collections::BTreeMap;
//! use tempfile::TempDir;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let temp_dir = TempDir::new()?;
//!     let mut store = create_local_store(temp_dir.path())?;
//!     store.initialize().await?;
//!
//!     let values = BTreeMap::from([("Perfect Amethyst".to_string(), 1.0)]);
//!     let trades = BTreeMap::from([("Perfect Amethyst".to_string(), serde_json::json!([]))]);
//!     let id = store.put_values(&values, &trades).await?;
//!     assert_eq!(store.load_latest().await?.map(|s| s.id), Some(id));
//!
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod local;
pub mod snapshot;

pub use backend::{InMemoryValuesStore, LocalValuesStore, ValuesStore};
pub use config::PersistenceConfig;
pub use error::{PersistenceError, Result};
pub use local::{create_local_store, create_local_store_with_config};
pub use snapshot::{ValueRecord, ValueSnapshot, TIME_FORMAT};

pub use chrono::{DateTime, Utc};
pub use uuid::Uuid;

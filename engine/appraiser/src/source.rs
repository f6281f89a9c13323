//! # Trade Data Sources
//!
//! Loaders that produce an [`OfferBook`] from exported trade documents.

use crate::models::{OfferBook, TradeRecord};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Result type alias for source operations
pub type Result<T> = std::result::Result<T, SourceError>;

/// Errors raised while loading trade documents
#[derive(Error, Debug)]
pub enum SourceError {
    /// I/O errors
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed corpus document
    #[error("Invalid trade document {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Path neither a file nor a directory
    #[error("Trade source not found: {0}")]
    NotFound(PathBuf),
}

/// A provider of the item → trades corpus
#[async_trait::async_trait]
pub trait TradeSource: Send + Sync {
    /// Fetch the full offer book
    async fn fetch_trades(&self) -> Result<OfferBook>;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}

/// Open the right source for `path`: a directory of per-item documents or a single corpus file
pub fn open_source(path: impl Into<PathBuf>) -> Result<Box<dyn TradeSource>> {
    let path = path.into();
    if path.is_dir() {
        Ok(Box::new(JsonDirectorySource::new(path)))
    } else if path.is_file() {
        Ok(Box::new(JsonFileSource::new(path)))
    } else {
        Err(SourceError::NotFound(path))
    }
}

/// A single JSON object mapping item name to its trade list
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl TradeSource for JsonFileSource {
    async fn fetch_trades(&self) -> Result<OfferBook> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io { path: self.path.clone(), source })?;
        let book: OfferBook = serde_json::from_str(&content)
            .map_err(|source| SourceError::Parse { path: self.path.clone(), source })?;

        info!("Loaded {} items ({} trades) from {:?}", book.len(), book.trade_count(), self.path);
        Ok(book)
    }

    fn describe(&self) -> String {
        format!("json file {}", self.path.display())
    }
}

/// A directory of `<item name>.json` documents, each holding that item's trade list
#[derive(Debug, Clone)]
pub struct JsonDirectorySource {
    dir: PathBuf,
}

impl JsonDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn read_document(path: &Path) -> Result<Vec<TradeRecord>> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SourceError::Io { path: path.to_path_buf(), source })?;
        serde_json::from_str(&content).map_err(|source| SourceError::Parse { path: path.to_path_buf(), source })
    }
}

#[async_trait::async_trait]
impl TradeSource for JsonDirectorySource {
    async fn fetch_trades(&self) -> Result<OfferBook> {
        let io_err = |source| SourceError::Io { path: self.dir.clone(), source };
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(io_err)?;
        let mut book = OfferBook::new();

        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(item) = path.file_stem().and_then(|stem| stem.to_str()).map(str::to_string) else {
                continue;
            };

            match Self::read_document(&path).await {
                Ok(trades) => book.insert(item, trades),
                Err(e) => warn!("Skipping trade document {:?}: {}", path, e),
            }
        }

        info!("Loaded {} items ({} trades) from {:?}", book.len(), book.trade_count(), self.dir);
        Ok(book)
    }

    fn describe(&self) -> String {
        format!("json directory {}", self.dir.display())
    }
}

/// A fixed in-memory offer book
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    book: OfferBook,
}

impl InMemorySource {
    pub fn new(book: OfferBook) -> Self {
        Self { book }
    }
}

#[async_trait::async_trait]
impl TradeSource for InMemorySource {
    async fn fetch_trades(&self) -> Result<OfferBook> {
        Ok(self.book.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory book of {} items", self.book.len())
    }
}

//! Persistence of the last completed exchange.
//!
//! Only one record is ever kept: every successful turn overwrites it.  Loading
//! is best effort; a missing or unreadable record simply means there is
//! nothing to restore.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde_json::{from_reader, to_writer};

use crate::error::{Error, Result};
use crate::types::LastExchange;

const STORE_DIR: &str = "chatstream";
const STORE_FILE: &str = "last_exchange.json";

/// A single-slot key-value store for the last exchange.
pub trait ExchangeStore: Send {
    /// Returns the stored exchange, if any can be read.
    fn load(&self) -> Option<LastExchange>;

    /// Replaces the stored exchange.
    fn save(&mut self, exchange: &LastExchange) -> Result<()>;
}

/// Stores the last exchange as a JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Creates a store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The per-user default location, under the platform data directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join(STORE_DIR).join(STORE_FILE))
    }

    /// The file backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ExchangeStore for FileStore {
    fn load(&self) -> Option<LastExchange> {
        let file = File::open(&self.path).ok()?;
        match from_reader(BufReader::new(file)) {
            Ok(exchange) => Some(exchange),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "ignoring unreadable last exchange");
                None
            }
        }
    }

    fn save(&mut self, exchange: &LastExchange) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|err| Error::io("failed to create store directory", err))?;
        }
        let file = File::create(&self.path)
            .map_err(|err| Error::io("failed to create last exchange file", err))?;
        to_writer(BufWriter::new(file), exchange).map_err(|err| {
            Error::serialization("failed to serialize last exchange", Some(Box::new(err)))
        })
    }
}

/// Keeps the last exchange in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    exchange: Option<LastExchange>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `exchange`.
    pub fn with_exchange(exchange: LastExchange) -> Self {
        Self {
            exchange: Some(exchange),
        }
    }
}

impl ExchangeStore for MemoryStore {
    fn load(&self) -> Option<LastExchange> {
        self.exchange.clone()
    }

    fn save(&mut self, exchange: &LastExchange) -> Result<()> {
        self.exchange = Some(exchange.clone());
        Ok(())
    }
}

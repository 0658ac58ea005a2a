//! Persistence for the cumulative win tally.
//!
//! The session itself persists nothing. The driver loads a [`WinTally`]
//! from a [`TallyStore`] at startup and saves it whenever it changes.

use crate::games::catchup::WinTally;
use derive_more::{Display, Error};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, instrument};

/// Tally store error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Tally store error: {} at {}:{}", message, file, line)]
pub struct StoreError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl StoreError {
    /// Creates a new store error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<std::io::Error> for StoreError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::new(format!("I/O error: {}", err))
    }
}

impl From<serde_json::Error> for StoreError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("JSON error: {}", err))
    }
}

/// Key-value store for win tallies.
pub trait TallyStore: Send + Sync {
    /// Loads the tally stored under `key`; a missing key is a zero tally.
    fn load(&self, key: &str) -> Result<WinTally, StoreError>;

    /// Stores `tally` under `key`.
    fn save(&self, key: &str, tally: WinTally) -> Result<(), StoreError>;
}

/// Stores every tally in one JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileTallyStore {
    path: PathBuf,
}

impl JsonFileTallyStore {
    /// Creates a store backed by `path`. The file is created on first save.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn new(path: impl AsRef<Path>) -> Self {
        info!("Creating JSON tally store");
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// File the tallies live in.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, WinTally>, StoreError> {
        if !self.path.exists() {
            debug!("Tally file does not exist yet");
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }
}

impl TallyStore for JsonFileTallyStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn load(&self, key: &str) -> Result<WinTally, StoreError> {
        let tally = self.read_all()?.get(key).copied().unwrap_or_default();
        debug!(p1 = tally.p1, p2 = tally.p2, "Loaded win tally");
        Ok(tally)
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn save(&self, key: &str, tally: WinTally) -> Result<(), StoreError> {
        let mut all = self.read_all()?;
        all.insert(key.to_string(), tally);
        let json = serde_json::to_string_pretty(&all)?;
        std::fs::write(&self.path, json)?;
        debug!(p1 = tally.p1, p2 = tally.p2, "Saved win tally");
        Ok(())
    }
}

/// In-process store, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryTallyStore {
    tallies: Mutex<BTreeMap<String, WinTally>>,
}

impl MemoryTallyStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TallyStore for MemoryTallyStore {
    fn load(&self, key: &str) -> Result<WinTally, StoreError> {
        let tallies = self
            .tallies
            .lock()
            .map_err(|_| StoreError::new("Tally store lock poisoned"))?;
        Ok(tallies.get(key).copied().unwrap_or_default())
    }

    fn save(&self, key: &str, tally: WinTally) -> Result<(), StoreError> {
        let mut tallies = self
            .tallies
            .lock()
            .map_err(|_| StoreError::new("Tally store lock poisoned"))?;
        tallies.insert(key.to_string(), tally);
        Ok(())
    }
}

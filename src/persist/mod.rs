//! Snapshot persistence over a local key-value store.

/// In-memory key-value backend.
pub mod memory;
/// SQLite key-value backend.
pub mod sqlite;

use std::path::PathBuf;

use crate::series::Series;

/// The single key holding the serialized collection.
pub const STORAGE_KEY: &str = "SeriesList";

/// Storage, serialization, or backend failure.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// SQLite backend error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// JSON encode/decode error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Any other failure.
    #[error("{0}")]
    Message(String),
}

/// Result alias for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;

/// Minimal string key-value storage.
pub trait KeyValueStore: Send {
    /// Reads the value under `key`, if any.
    fn get(&self, key: &str) -> PersistResult<Option<String>>;
    /// Writes `value` under `key`, replacing any prior value.
    fn set(&mut self, key: &str, value: &str) -> PersistResult<()>;
    /// Deletes `key`. Deleting an absent key is not an error.
    fn remove(&mut self, key: &str) -> PersistResult<()>;
}

/// Reads and writes whole-collection snapshots under [`STORAGE_KEY`].
pub struct PersistenceAdapter {
    store: Box<dyn KeyValueStore>,
}

impl PersistenceAdapter {
    /// Wraps a key-value backend.
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Serializes and writes the collection, surfacing any failure.
    pub fn try_save(&mut self, collection: &[Series]) -> PersistResult<()> {
        let json = serde_json::to_string(collection)?;
        self.store.set(STORAGE_KEY, &json)
    }

    /// Best-effort [`PersistenceAdapter::try_save`]: failures are logged and
    /// dropped; the caller's in-memory state stays authoritative.
    pub fn save(&mut self, collection: &[Series]) {
        match self.try_save(collection) {
            Ok(()) => log::debug!("saved {} series", collection.len()),
            Err(err) => log::warn!("failed to save series list: {err}"),
        }
    }

    /// Reads the stored collection; `Ok(None)` when nothing was ever saved.
    pub fn try_load(&self) -> PersistResult<Option<Vec<Series>>> {
        let Some(json) = self.store.get(STORAGE_KEY)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    /// Reads the stored collection, falling back to empty on absence or error.
    pub fn load(&self) -> Vec<Series> {
        match self.try_load() {
            Ok(Some(series)) => {
                log::info!("loaded {} series", series.len());
                series
            }
            Ok(None) => {
                log::info!("no saved series list, starting fresh");
                Vec::new()
            }
            Err(err) => {
                log::warn!("failed to load series list, starting fresh: {err}");
                Vec::new()
            }
        }
    }

    /// Deletes the stored collection.
    pub fn clear(&mut self) -> PersistResult<()> {
        self.store.remove(STORAGE_KEY)
    }
}

/// Default on-device database location, `<data_dir>/seriestrack/seriestrack.db`.
pub fn default_database_path() -> PersistResult<PathBuf> {
    let base = dirs::data_dir()
        .ok_or_else(|| PersistError::Message("unable to resolve data directory".to_string()))?;
    Ok(base.join("seriestrack").join("seriestrack.db"))
}

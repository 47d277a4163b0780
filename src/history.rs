//! Persisted set of already-processed paper identifiers.
//!
//! The history is a JSON array of identifier strings in the base directory.
//! It is loaded once at startup and rewritten after every newly downloaded
//! paper, so an externally killed run loses at most the item in flight.
//!
//! Loading fails open on purpose: a missing, unreadable or malformed file
//! yields an empty set and never an error. The on-disk PDF check still
//! keeps already downloaded papers from being fetched again.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument, warn};

/// File name of the history inside the base directory.
pub const HISTORY_FILE_NAME: &str = "download_history.json";

/// Errors produced while saving the history.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// I/O error writing the history file.
    #[error("I/O error writing history {path}: {source}")]
    Io {
        /// History file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// JSON-file backed store for the history set.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Creates a store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store for [`HISTORY_FILE_NAME`] inside `base_dir`.
    #[must_use]
    pub fn in_dir(base_dir: &Path) -> Self {
        Self::new(base_dir.join(HISTORY_FILE_NAME))
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted identifiers, or an empty set on any failure.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> HashSet<String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!("no history file yet, starting empty");
                return HashSet::new();
            }
            Err(error) => {
                warn!(error = %error, "history unreadable, treating nothing as seen");
                return HashSet::new();
            }
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(ids) => {
                let ids: HashSet<String> = ids.into_iter().collect();
                debug!(count = ids.len(), "history loaded");
                ids
            }
            Err(error) => {
                warn!(error = %error, "history malformed, treating nothing as seen");
                HashSet::new()
            }
        }
    }

    /// Overwrites the history file with `ids`.
    ///
    /// Identifiers are written sorted so the file diffs cleanly between runs.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] when serialization or the file write fails.
    #[instrument(skip(self, ids), fields(path = %self.path.display(), count = ids.len()))]
    pub fn save(&self, ids: &HashSet<String>) -> Result<(), HistoryError> {
        let mut sorted: Vec<&String> = ids.iter().collect();
        sorted.sort();
        let json = serde_json::to_string_pretty(&sorted)?;
        fs::write(&self.path, json).map_err(|source| HistoryError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!("history saved");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn ids(values: &[&str]) -> HashSet<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = HistoryStore::in_dir(temp_dir.path());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_load_malformed_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = HistoryStore::in_dir(temp_dir.path());
        fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_load_wrong_shape_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = HistoryStore::in_dir(temp_dir.path());
        fs::write(store.path(), r#"{"ids": ["2401.00001"]}"#).unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_load_directory_instead_of_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = HistoryStore::in_dir(temp_dir.path());
        fs::create_dir(store.path()).unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = HistoryStore::in_dir(temp_dir.path());
        let original = ids(&["2401.00001v1", "2312.99999v2", "hep-th/9901001v1", "", "ünïcödé"]);

        store.save(&original).unwrap();
        let loaded = store.load();
        assert_eq!(loaded, original);

        store.save(&loaded).unwrap();
        assert_eq!(store.load(), original);
    }

    #[test]
    fn test_save_writes_sorted_json_array() {
        let temp_dir = TempDir::new().unwrap();
        let store = HistoryStore::in_dir(temp_dir.path());

        store.save(&ids(&["b", "a"])).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        let parsed: Vec<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, vec!["a".to_string(), "b".to_string()]);
        assert!(raw.contains("\n  \"a\""), "expected 2-space indentation: {raw}");
    }

    #[test]
    fn test_save_overwrites_previous_content() {
        let temp_dir = TempDir::new().unwrap();
        let store = HistoryStore::in_dir(temp_dir.path());

        store.save(&ids(&["a", "b", "c"])).unwrap();
        store.save(&ids(&["z"])).unwrap();

        assert_eq!(store.load(), ids(&["z"]));
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = HistoryStore::new(temp_dir.path().join("missing").join(HISTORY_FILE_NAME));

        let err = store.save(&ids(&["a"])).unwrap_err();
        assert!(matches!(err, HistoryError::Io { .. }));
    }
}

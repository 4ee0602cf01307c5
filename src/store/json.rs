//! Cached JSON file read/write utility
//!
//! Reads go through an in-memory cache that is invalidated synchronously
//! after every successful write. Writes take a per-path exclusive lock for
//! their duration; there is no cross-file transaction. Files are written
//! pretty-printed; serde_json leaves non-ASCII unescaped. Object keys
//! serialize in sorted order.

use dashmap::DashMap;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

/// Failure modes of the file store
///
/// `Malformed` is separated from `Io` so that read paths can degrade
/// gracefully on corrupt files while still surfacing infrastructure
/// failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed JSON in {path}: {detail}")]
    Malformed { path: PathBuf, detail: String },

    #[error("Failed to encode JSON for {path}: {detail}")]
    Encode { path: PathBuf, detail: String },
}

/// Cached JSON file store with per-path write locks
pub struct JsonStore {
    cache: DashMap<PathBuf, Arc<Value>>,
    write_locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl JsonStore {
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
            write_locks: DashMap::new(),
        }
    }

    fn write_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        self.write_locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Read and parse a JSON file.
    ///
    /// Returns `Ok(None)` when the file does not exist. Any other I/O
    /// failure or a parse failure is returned as an error; the caller
    /// decides whether to degrade or surface it.
    pub async fn read(&self, path: &Path) -> Result<Option<Arc<Value>>, StoreError> {
        if let Some(cached) = self.cache.get(path) {
            return Ok(Some(cached.clone()));
        }

        let bytes = match fs::read(path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        let value: Value = serde_json::from_slice(&bytes).map_err(|e| StoreError::Malformed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

        let value = Arc::new(value);
        self.cache.insert(path.to_path_buf(), value.clone());
        Ok(Some(value))
    }

    /// Read a JSON file expected to contain an object, returning its map.
    ///
    /// A file holding any other JSON type is reported as malformed.
    pub async fn read_object(&self, path: &Path) -> Result<Option<Map<String, Value>>, StoreError> {
        match self.read(path).await? {
            None => Ok(None),
            Some(value) => match value.as_ref() {
                Value::Object(map) => Ok(Some(map.clone())),
                _ => Err(StoreError::Malformed {
                    path: path.to_path_buf(),
                    detail: "expected a JSON object".to_string(),
                }),
            },
        }
    }

    /// Like `read_object`, but treats a missing or corrupt file as empty.
    ///
    /// Used on read paths where per-file failures must not surface to the
    /// caller. The degradation is logged at debug level.
    pub async fn read_object_lenient(&self, path: &Path) -> Map<String, Value> {
        match self.read_object(path).await {
            Ok(Some(map)) => map,
            Ok(None) => Map::new(),
            Err(e) => {
                debug!("Treating unreadable file as empty: {}", e);
                Map::new()
            }
        }
    }

    /// Write a JSON value to a file, pretty-printed.
    ///
    /// Creates parent directories as needed, holds the path's exclusive
    /// write lock for the duration, and invalidates the cache entry before
    /// returning.
    pub async fn write_pretty(&self, path: &Path, value: &Value) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(value).map_err(|e| StoreError::Encode {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

        let lock = self.write_lock(path);
        let _guard = lock.lock().await;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| StoreError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        fs::write(path, json).await.map_err(|e| StoreError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        self.invalidate(path);
        Ok(())
    }

    /// Merge entries into a JSON object file: union with existing content,
    /// incoming keys win. Creates the file when absent. A corrupt existing
    /// file is treated as empty and overwritten.
    pub async fn merge_object(
        &self,
        path: &Path,
        entries: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut merged = match self.read_object(path).await {
            Ok(Some(existing)) => existing,
            Ok(None) => Map::new(),
            Err(e) if matches!(e, StoreError::Malformed { .. }) => {
                debug!("Overwriting corrupt object file: {}", e);
                Map::new()
            }
            Err(e) => return Err(e),
        };

        for (key, value) in entries {
            merged.insert(key.clone(), value.clone());
        }

        self.write_pretty(path, &Value::Object(merged)).await
    }

    /// Remove a key from a JSON object file.
    ///
    /// Missing file or missing key is a silent no-op. Returns whether the
    /// key was present and removed.
    pub async fn remove_key(&self, path: &Path, key: &str) -> Result<bool, StoreError> {
        let mut map = match self.read_object(path).await {
            Ok(Some(existing)) => existing,
            Ok(None) => return Ok(false),
            Err(e) if matches!(e, StoreError::Malformed { .. }) => {
                debug!("Skipping corrupt object file during key removal: {}", e);
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        if map.remove(key).is_none() {
            return Ok(false);
        }

        self.write_pretty(path, &Value::Object(map)).await?;
        Ok(true)
    }

    /// Drop the cache entry for a path
    pub fn invalidate(&self, path: &Path) {
        self.cache.remove(path);
    }
}

impl Default for JsonStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn obj(pairs: &[(&str, &str)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect()
    }

    #[tokio::test]
    async fn test_read_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new();
        let result = store.read(&dir.path().join("absent.json")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_write_and_read_back() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new();
        let path = dir.path().join("nested/dir/file.json");

        store
            .write_pretty(&path, &json!({"Easter": "Dominica Paschae"}))
            .await
            .unwrap();

        let map = store.read_object(&path).await.unwrap().unwrap();
        assert_eq!(map.get("Easter").unwrap(), "Dominica Paschae");
    }

    #[tokio::test]
    async fn test_merge_unions_and_new_keys_win() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new();
        let path = dir.path().join("i18n.json");

        store
            .merge_object(&path, &obj(&[("Easter", "old"), ("Pentecost", "kept")]))
            .await
            .unwrap();
        store.merge_object(&path, &obj(&[("Easter", "new")])).await.unwrap();

        let map = store.read_object(&path).await.unwrap().unwrap();
        assert_eq!(map.get("Easter").unwrap(), "new");
        assert_eq!(map.get("Pentecost").unwrap(), "kept");
    }

    #[tokio::test]
    async fn test_remove_key_silent_on_missing() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new();
        let path = dir.path().join("i18n.json");

        assert!(!store.remove_key(&path, "Easter").await.unwrap());

        store.merge_object(&path, &obj(&[("Easter", "x")])).await.unwrap();
        assert!(store.remove_key(&path, "Easter").await.unwrap());
        assert!(!store.remove_key(&path, "Easter").await.unwrap());
    }

    #[tokio::test]
    async fn test_cache_invalidated_on_write() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new();
        let path = dir.path().join("file.json");

        store.write_pretty(&path, &json!({"a": "1"})).await.unwrap();
        // Populate the cache
        let _ = store.read(&path).await.unwrap();
        store.write_pretty(&path, &json!({"a": "2"})).await.unwrap();

        let map = store.read_object(&path).await.unwrap().unwrap();
        assert_eq!(map.get("a").unwrap(), "2");
    }

    #[tokio::test]
    async fn test_lenient_read_swallows_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, b"{ not json").unwrap();

        assert!(store.read_object_lenient(&path).await.is_empty());
        assert!(matches!(
            store.read_object(&path).await,
            Err(StoreError::Malformed { .. })
        ));
    }
}

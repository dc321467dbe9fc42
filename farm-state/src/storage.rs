//! Key-value persistence for state collections.
//!
//! Each collection is stored as one JSON array under its
//! [`Collection::key`](crate::Collection::key). Backends:
//!
//! - [`MemoryKeyValueStore`]: in-process, for tests and ephemeral sessions
//! - [`FileKeyValueStore`]: one `<key>.json` file per key under a directory

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::state::{AppState, Collection};
use crate::store::StateSubscriber;

/// Storage backend errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt value under {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Persistent key-value storage of JSON values.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// All stored keys, sorted.
    async fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Read and decode `key`, falling back to `T::default()` when absent.
pub async fn get_or_default<T>(store: &dyn KeyValueStore, key: &str) -> Result<T, StorageError>
where
    T: DeserializeOwned + Default,
{
    match store.get(key).await? {
        Some(value) => serde_json::from_value(value).map_err(|source| StorageError::Corrupt {
            key: key.to_string(),
            source,
        }),
        None => Ok(T::default()),
    }
}

/// In-memory store.
#[derive(Clone, Default)]
pub struct MemoryKeyValueStore {
    values: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.write().await.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = self.values.read().await.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

/// Directory of JSON files, one per key.
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        debug!(dir = %dir.display(), "Opened file store");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let path = self.path_for(key)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let value = serde_json::from_slice(&bytes).map_err(|source| StorageError::Corrupt {
            key: key.to_string(),
            source,
        })?;
        Ok(Some(value))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let bytes = serde_json::to_vec_pretty(&value).map_err(|source| StorageError::Corrupt {
            key: key.to_string(),
            source,
        })?;

        // Write-then-rename so readers never see a half-written file
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Hydrate a state from storage.
///
/// Missing keys load as empty collections. A stored value that does not
/// decode is logged and left at its default so the other collections
/// still load. IO failures are returned.
pub async fn load_state(store: &dyn KeyValueStore) -> Result<AppState, StorageError> {
    let mut state = AppState::default();
    for collection in Collection::ALL {
        let key = collection.key();
        let value = match store.get(key).await {
            Ok(Some(value)) => value,
            Ok(None) => continue,
            Err(StorageError::Corrupt { source, .. }) => {
                warn!(key, error = %source, "Stored collection is not valid JSON, using default");
                continue;
            }
            Err(e) => return Err(e),
        };
        if let Err(e) = state.set_collection(collection, value) {
            warn!(key, error = %e, "Stored collection does not decode, using default");
        }
    }
    debug!(farms = state.farms.len(), "Loaded state");
    Ok(state)
}

/// Subscriber writing every changed collection back to storage.
pub struct PersistenceSubscriber {
    store: Arc<dyn KeyValueStore>,
}

impl PersistenceSubscriber {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StateSubscriber for PersistenceSubscriber {
    fn name(&self) -> &str {
        "persistence"
    }

    async fn on_change(
        &self,
        state: &AppState,
        changed: &[Collection],
    ) -> Result<(), crate::StateError> {
        for collection in changed {
            let value = state.collection_value(*collection)?;
            self.store.set(collection.key(), value).await?;
            debug!(key = collection.key(), "Persisted collection");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sustainability::Farm;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_blocking() {
        let store = MemoryKeyValueStore::new();
        tokio_test::block_on(async {
            store.set("farms", serde_json::json!([])).await.unwrap();
            assert_eq!(store.get("farms").await.unwrap(), Some(serde_json::json!([])));
            assert_eq!(store.get("tasks").await.unwrap(), None);
            store.remove("farms").await.unwrap();
            assert!(store.is_empty().await);
        });
    }

    #[tokio::test]
    async fn test_get_or_default() {
        let store = MemoryKeyValueStore::new();
        let farms: Vec<Farm> = get_or_default(&store, "farms").await.unwrap();
        assert!(farms.is_empty());

        store.set("farms", serde_json::json!({"not": "a list"})).await.unwrap();
        let result: Result<Vec<Farm>, _> = get_or_default(&store, "farms").await;
        assert!(matches!(result, Err(StorageError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::open(dir.path().join("data")).await.unwrap();

        store
            .set("cropPlanEvents", serde_json::json!([{"id": 1}]))
            .await
            .unwrap();
        store.set("farms", serde_json::json!([])).await.unwrap();

        assert_eq!(
            store.get("cropPlanEvents").await.unwrap(),
            Some(serde_json::json!([{"id": 1}]))
        );
        assert_eq!(store.keys().await.unwrap(), vec!["cropPlanEvents", "farms"]);

        store.remove("farms").await.unwrap();
        store.remove("farms").await.unwrap();
        assert_eq!(store.get("farms").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_rejects_path_keys() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::open(dir.path()).await.unwrap();
        let err = store.set("../escape", serde_json::json!(1)).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::open(dir.path()).await.unwrap();
        tokio::fs::write(dir.path().join("farms.json"), b"{not json")
            .await
            .unwrap();
        assert!(matches!(
            store.get("farms").await,
            Err(StorageError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_state_defaults_missing_keys() {
        let store = MemoryKeyValueStore::new();
        store
            .set("farms", serde_json::to_value(vec![Farm::new(1, "North", "corn")]).unwrap())
            .await
            .unwrap();

        let state = load_state(&store).await.unwrap();
        assert_eq!(state.farms.len(), 1);
        assert!(state.tasks.is_empty());
        assert!(state.fuel_records.is_empty());
    }

    #[tokio::test]
    async fn test_load_state_skips_undecodable_collection() {
        let store = MemoryKeyValueStore::new();
        store
            .set(
                "farms",
                serde_json::json!([{"id": 1, "name": "North", "waterHistory": "not a list"}]),
            )
            .await
            .unwrap();
        store
            .set(
                "tasks",
                serde_json::json!([{
                    "id": 1,
                    "title": "Order seed",
                    "dueDate": "2024-03-01",
                    "priority": "medium",
                    "completed": false
                }]),
            )
            .await
            .unwrap();

        let state = load_state(&store).await.unwrap();
        assert!(state.farms.is_empty());
        assert_eq!(state.tasks[0].title, "Order seed");
    }

    #[tokio::test]
    async fn test_load_state_accepts_blank_amounts() {
        let store = MemoryKeyValueStore::new();
        store
            .set(
                "farms",
                serde_json::json!([{
                    "id": 1,
                    "name": "North",
                    "waterHistory": [{"amount": null, "date": "2024-06-01"}]
                }]),
            )
            .await
            .unwrap();

        let state = load_state(&store).await.unwrap();
        assert_eq!(state.farms[0].water_history[0].amount, 0.0);
    }

    #[tokio::test]
    async fn test_load_state_skips_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::open(dir.path()).await.unwrap();
        tokio::fs::write(dir.path().join("farms.json"), b"{not json")
            .await
            .unwrap();
        store.set("tasks", serde_json::json!([])).await.unwrap();

        let state = load_state(&store).await.unwrap();
        assert!(state.farms.is_empty());
    }

    #[tokio::test]
    async fn test_persistence_subscriber_writes_changed_only() {
        let store = MemoryKeyValueStore::new();
        let subscriber = PersistenceSubscriber::new(Arc::new(store.clone()));

        let mut state = AppState::default();
        state.farms.push(Farm::new(1, "North", "corn"));
        subscriber
            .on_change(&state, &[Collection::Farms])
            .await
            .unwrap();

        assert_eq!(store.keys().await.unwrap(), vec!["farms"]);
    }
}

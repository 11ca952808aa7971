//! Key-value persistence for the cart and wishlist containers.
//!
//! State is stored as a JSON envelope `{"state": ..., "version": N}` under a
//! fixed logical name. Reads never fail the caller: a missing or unreadable
//! value comes back as the container's default state.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

pub const CART_STORAGE_KEY: &str = "cart-storage";
pub const WISHLIST_STORAGE_KEY: &str = "wishlist-storage";
pub const STATE_VERSION: u32 = 0;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize state: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("storage lock poisoned")]
    Poisoned,
}

pub trait StateStorage {
    fn get_item(&self, name: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, name: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, name: &str) -> Result<(), StorageError>;
}

impl<S: StateStorage + ?Sized> StateStorage for &S {
    fn get_item(&self, name: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(name)
    }

    fn set_item(&self, name: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(name, value)
    }

    fn remove_item(&self, name: &str) -> Result<(), StorageError> {
        (**self).remove_item(name)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    state: T,
    #[serde(default)]
    version: u32,
}

pub fn load_state<S, T>(storage: &S, name: &str) -> T
where
    S: StateStorage + ?Sized,
    T: DeserializeOwned + Default,
{
    let raw = match storage.get_item(name) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(e) => {
            log::warn!("Failed to read persisted {}: {}", name, e);
            return T::default();
        }
    };

    match serde_json::from_str::<Envelope<T>>(&raw) {
        Ok(envelope) => envelope.state,
        Err(e) => {
            log::warn!("Discarding malformed persisted {}: {}", name, e);
            T::default()
        }
    }
}

pub fn save_state<S, T>(storage: &S, name: &str, state: &T) -> Result<(), StorageError>
where
    S: StateStorage + ?Sized,
    T: Serialize,
{
    let raw = serde_json::to_string(&Envelope { state, version: STATE_VERSION })?;
    storage.set_item(name, &raw)
}

/// One JSON file per logical name inside a directory.
#[derive(Debug, Clone)]
pub struct FileStateStorage {
    dir: PathBuf,
}

impl FileStateStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage scoped to a single browser session under `root`.
    pub fn for_visitor(root: &Path, visitor_id: Uuid) -> Self {
        Self::new(root.join(visitor_id.to_string()))
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, StorageError> {
        let valid = !name.is_empty()
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey(name.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", name)))
    }
}

impl StateStorage for FileStateStorage {
    fn get_item(&self, name: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(name)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, name: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.dir)?;
        // Each write gets its own temp file so overlapping saves from one
        // visitor replace the value whole; the last rename wins.
        let tmp = self.dir.join(format!("{}.{}.tmp", name, Uuid::new_v4().simple()));
        if let Err(e) = fs::write(&tmp, value).and_then(|()| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn remove_item(&self, name: &str) -> Result<(), StorageError> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStateStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStateStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStorage for MemoryStateStorage {
    fn get_item(&self, name: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(items.get(name).cloned())
    }

    fn set_item(&self, name: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        items.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, name: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        items.remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Counter {
        hits: u32,
    }

    #[test]
    fn missing_value_loads_default() {
        let storage = MemoryStateStorage::new();
        let state: Counter = load_state(&storage, "counter");
        assert_eq!(state, Counter::default());
    }

    #[test]
    fn corrupt_value_loads_default() {
        let storage = MemoryStateStorage::new();
        storage.set_item("counter", "{not json").unwrap();
        let state: Counter = load_state(&storage, "counter");
        assert_eq!(state, Counter::default());

        storage.set_item("counter", r#"{"state": {"hits": "many"}}"#).unwrap();
        let state: Counter = load_state(&storage, "counter");
        assert_eq!(state, Counter::default());
    }

    #[test]
    fn saved_state_is_wrapped_in_envelope() {
        let storage = MemoryStateStorage::new();
        save_state(&storage, "counter", &Counter { hits: 3 }).unwrap();

        let raw = storage.get_item("counter").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["state"]["hits"], 3);
        assert_eq!(value["version"], 0);

        let state: Counter = load_state(&storage, "counter");
        assert_eq!(state.hits, 3);
    }

    #[test]
    fn file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let visitor = Uuid::new_v4();

        let storage = FileStateStorage::for_visitor(dir.path(), visitor);
        save_state(&storage, CART_STORAGE_KEY, &Counter { hits: 7 }).unwrap();

        let reopened = FileStateStorage::for_visitor(dir.path(), visitor);
        let state: Counter = load_state(&reopened, CART_STORAGE_KEY);
        assert_eq!(state.hits, 7);

        reopened.remove_item(CART_STORAGE_KEY).unwrap();
        assert!(reopened.get_item(CART_STORAGE_KEY).unwrap().is_none());
        reopened.remove_item(CART_STORAGE_KEY).unwrap();
    }

    #[test]
    fn overlapping_file_writes_never_corrupt_state() {
        let dir = tempfile::tempdir().unwrap();
        let storage = std::sync::Arc::new(FileStateStorage::for_visitor(dir.path(), Uuid::new_v4()));
        let long = Counter { hits: u32::MAX };
        let short = Counter { hits: 1 };

        let writers: Vec<_> = (0..4)
            .map(|n| {
                let storage = storage.clone();
                let state = if n % 2 == 0 { long.hits } else { short.hits };
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        save_state(storage.as_ref(), CART_STORAGE_KEY, &Counter { hits: state }).unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let raw = storage.get_item(CART_STORAGE_KEY).unwrap().unwrap();
        let envelope: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let hits = envelope["state"]["hits"].as_u64().unwrap();
        assert!(hits == u64::from(long.hits) || hits == u64::from(short.hits));

        let leftovers: Vec<_> = fs::read_dir(&storage.dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn file_storage_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStateStorage::new(dir.path());
        assert!(matches!(
            storage.set_item("../escape", "{}"),
            Err(StorageError::InvalidKey(_))
        ));
    }
}

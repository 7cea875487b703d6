//! Storage layer for taskbuddy
//!
//! All persisted state is a handful of named JSON blobs:
//!
//! ```text
//! <data dir>/
//!   users.json          # array of User records
//!   credentials.json    # { user id -> argon2 PHC string }
//!   tasks.json          # array of Task records
//!   session.json        # id of the logged-in user, or null
//!   *.lock              # fs2 lock files guarding read-modify-write
//! ```
//!
//! `BlobStore` is the only I/O boundary. A missing key reads as `None` and
//! typed loads fall back to the collection's `Default`, never an error.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};

pub const USERS_KEY: &str = "users";
pub const CREDENTIALS_KEY: &str = "credentials";
pub const TASKS_KEY: &str = "tasks";
pub const SESSION_KEY: &str = "session";

/// Blob mutation callback: receives the current blob, returns the blob to
/// store (`None` leaves the key untouched).
pub type BlobUpdate<'a> = dyn FnMut(Option<&str>) -> Result<Option<String>> + 'a;

/// Key-value blob storage
pub trait BlobStore: fmt::Debug + Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>>;

    fn write(&self, key: &str, blob: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Read-modify-write `key` while no other writer can touch it.
    fn update(&self, key: &str, f: &mut BlobUpdate<'_>) -> Result<()>;
}

fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!("invalid storage key '{key}'")))
    }
}

// =========================================================================
// File-backed store
// =========================================================================

/// One `<key>.json` file per key in a data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    lock_timeout_ms: u64,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    pub fn with_lock_timeout(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn blob_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    fn lock_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.lock"))
    }

    fn read_path(&self, key: &str, path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::storage(key, err)),
        }
    }

    fn lock(&self, key: &str) -> Result<FileLock> {
        FileLock::acquire(self.lock_path(key), self.lock_timeout_ms).map_err(|err| match err {
            Error::LockFailed(_) => err,
            other => Error::storage(key, other),
        })
    }
}

impl BlobStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        self.read_path(key, &self.blob_path(key))
    }

    fn write(&self, key: &str, blob: &str) -> Result<()> {
        validate_key(key)?;
        let _lock = self.lock(key)?;
        lock::write_atomic(self.blob_path(key), blob.as_bytes())
            .map_err(|err| Error::storage(key, err))
    }

    fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let _lock = self.lock(key)?;
        match fs::remove_file(self.blob_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::storage(key, err)),
        }
    }

    fn update(&self, key: &str, f: &mut BlobUpdate<'_>) -> Result<()> {
        validate_key(key)?;
        let path = self.blob_path(key);
        let _lock = self.lock(key)?;
        let current = self.read_path(key, &path)?;
        if let Some(next) = f(current.as_deref())? {
            lock::write_atomic(&path, next.as_bytes()).map_err(|err| Error::storage(key, err))?;
        }
        Ok(())
    }
}

// =========================================================================
// In-memory store
// =========================================================================

/// Process-local store, used by tests and embedders.
///
/// Each key has its own update lock, so an update of one collection may
/// nest an update of another, as with `FileStore`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, String>>,
    key_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn blobs(&self, key: &str) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.blobs
            .lock()
            .map_err(|_| Error::storage(key, "memory store poisoned"))
    }

    fn key_lock(&self, key: &str) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .key_locks
            .lock()
            .map_err(|_| Error::storage(key, "memory store poisoned"))?;
        Ok(Arc::clone(locks.entry(key.to_string()).or_default()))
    }
}

impl BlobStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        Ok(self.blobs(key)?.get(key).cloned())
    }

    fn write(&self, key: &str, blob: &str) -> Result<()> {
        validate_key(key)?;
        let lock = self.key_lock(key)?;
        let _guard = lock
            .lock()
            .map_err(|_| Error::storage(key, "memory store poisoned"))?;
        self.blobs(key)?.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let lock = self.key_lock(key)?;
        let _guard = lock
            .lock()
            .map_err(|_| Error::storage(key, "memory store poisoned"))?;
        self.blobs(key)?.remove(key);
        Ok(())
    }

    fn update(&self, key: &str, f: &mut BlobUpdate<'_>) -> Result<()> {
        validate_key(key)?;
        let lock = self.key_lock(key)?;
        let _guard = lock
            .lock()
            .map_err(|_| Error::storage(key, "memory store poisoned"))?;
        let current = self.blobs(key)?.get(key).cloned();
        if let Some(next) = f(current.as_deref())? {
            self.blobs(key)?.insert(key.to_string(), next);
        }
        Ok(())
    }
}

// =========================================================================
// Typed access
// =========================================================================

/// Shared handle that (de)serializes collections on top of a `BlobStore`
#[derive(Debug, Clone)]
pub struct Storage {
    backend: Arc<dyn BlobStore>,
}

impl Storage {
    pub fn new(backend: Arc<dyn BlobStore>) -> Self {
        Self { backend }
    }

    /// Storage rooted at a data directory
    pub fn open_dir(root: impl Into<PathBuf>, lock_timeout_ms: u64) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let store = FileStore::new(root).with_lock_timeout(lock_timeout_ms);
        Ok(Self::new(Arc::new(store)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn backend(&self) -> &dyn BlobStore {
        self.backend.as_ref()
    }

    /// Whether anything has ever been written under `key`
    pub fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.backend.read(key)?.is_some())
    }

    /// Load a collection, falling back to `T::default()` when absent
    pub fn load<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.backend.read(key)? {
            Some(blob) => decode(key, &blob),
            None => Ok(T::default()),
        }
    }

    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let blob = encode(key, value)?;
        self.backend.write(key, &blob)
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.backend.remove(key)
    }

    /// Locked read-modify-write of a collection.
    ///
    /// The collection is written back only when `f` succeeds and the
    /// serialized value actually changed.
    pub fn update<T, R, F>(&self, key: &str, f: F) -> Result<R>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> Result<R>,
    {
        let mut f = Some(f);
        let mut outcome = None;
        self.backend.update(key, &mut |current| {
            let mut value: T = match current {
                Some(blob) => decode(key, blob)?,
                None => T::default(),
            };
            let apply = f
                .take()
                .ok_or_else(|| Error::OperationFailed(format!("update of '{key}' re-entered")))?;
            outcome = Some(apply(&mut value)?);
            let next = encode(key, &value)?;
            let unchanged = match current {
                Some(blob) => blob == next,
                None => next == encode(key, &T::default())?,
            };
            Ok(if unchanged { None } else { Some(next) })
        })?;
        outcome.ok_or_else(|| Error::OperationFailed(format!("update of '{key}' did not run")))
    }

    /// Write `value` under `key` only if nothing is stored there yet.
    ///
    /// The check and the write happen under one lock. Returns whether the
    /// value was written.
    pub fn init<T: Serialize>(&self, key: &str, value: &T) -> Result<bool> {
        let blob = encode(key, value)?;
        let mut blob = Some(blob);
        let mut written = false;
        self.backend.update(key, &mut |current| {
            if current.is_some() {
                return Ok(None);
            }
            written = true;
            Ok(blob.take())
        })?;
        Ok(written)
    }
}

fn decode<T: DeserializeOwned>(key: &str, blob: &str) -> Result<T> {
    serde_json::from_str(blob).map_err(|err| Error::storage(key, format!("corrupt blob: {err}")))
}

fn encode<T: Serialize>(key: &str, value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|err| Error::storage(key, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn stores(dir: &TempDir) -> Vec<Storage> {
        vec![
            Storage::in_memory(),
            Storage::open_dir(dir.path().join("data"), 1000).unwrap(),
        ]
    }

    #[test]
    fn missing_key_reads_as_default() {
        let dir = TempDir::new().unwrap();
        for storage in stores(&dir) {
            assert!(storage.backend().read(TASKS_KEY).unwrap().is_none());
            let tasks: Vec<String> = storage.load(TASKS_KEY).unwrap();
            assert!(tasks.is_empty());
            let creds: BTreeMap<String, String> = storage.load(CREDENTIALS_KEY).unwrap();
            assert!(creds.is_empty());
            assert!(!storage.contains(TASKS_KEY).unwrap());
        }
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        for storage in stores(&dir) {
            storage
                .save(USERS_KEY, &vec!["a".to_string(), "b".to_string()])
                .unwrap();
            let users: Vec<String> = storage.load(USERS_KEY).unwrap();
            assert_eq!(users, vec!["a", "b"]);
            assert!(storage.contains(USERS_KEY).unwrap());

            storage.remove(USERS_KEY).unwrap();
            storage.remove(USERS_KEY).unwrap();
            assert!(!storage.contains(USERS_KEY).unwrap());
        }
    }

    #[test]
    fn update_writes_back_only_on_success() {
        let dir = TempDir::new().unwrap();
        for storage in stores(&dir) {
            let len = storage
                .update(TASKS_KEY, |tasks: &mut Vec<u32>| {
                    tasks.push(1);
                    tasks.push(2);
                    Ok(tasks.len())
                })
                .unwrap();
            assert_eq!(len, 2);

            let err = storage
                .update(TASKS_KEY, |tasks: &mut Vec<u32>| -> Result<()> {
                    tasks.clear();
                    Err(Error::NotFound("nope".to_string()))
                })
                .unwrap_err();
            assert!(matches!(err, Error::NotFound(_)));

            let tasks: Vec<u32> = storage.load(TASKS_KEY).unwrap();
            assert_eq!(tasks, vec![1, 2]);
        }
    }

    #[test]
    fn nested_update_of_another_key() {
        let dir = TempDir::new().unwrap();
        for storage in stores(&dir) {
            storage
                .update(USERS_KEY, |users: &mut Vec<String>| {
                    storage.update(CREDENTIALS_KEY, |creds: &mut BTreeMap<String, String>| {
                        creds.insert("u1".to_string(), "hash".to_string());
                        Ok(())
                    })?;
                    users.push("u1".to_string());
                    Ok(())
                })
                .unwrap();

            let users: Vec<String> = storage.load(USERS_KEY).unwrap();
            assert_eq!(users, vec!["u1"]);
            let creds: BTreeMap<String, String> = storage.load(CREDENTIALS_KEY).unwrap();
            assert_eq!(creds.get("u1").map(String::as_str), Some("hash"));
        }
    }

    #[test]
    fn init_writes_only_when_absent() {
        let dir = TempDir::new().unwrap();
        for storage in stores(&dir) {
            assert!(storage.init(TASKS_KEY, &vec![1u32, 2]).unwrap());
            assert!(!storage.init(TASKS_KEY, &vec![9u32]).unwrap());
            let tasks: Vec<u32> = storage.load(TASKS_KEY).unwrap();
            assert_eq!(tasks, vec![1, 2]);
        }
    }

    #[test]
    fn update_without_change_does_not_create_key() {
        let dir = TempDir::new().unwrap();
        for storage in stores(&dir) {
            let found = storage
                .update(TASKS_KEY, |tasks: &mut Vec<u32>| {
                    Ok(tasks.iter().any(|id| *id == 7))
                })
                .unwrap();
            assert!(!found);
            assert!(!storage.contains(TASKS_KEY).unwrap());
        }
    }

    #[test]
    fn corrupt_blob_is_storage_unavailable() {
        let dir = TempDir::new().unwrap();
        for storage in stores(&dir) {
            storage.backend().write(TASKS_KEY, "{not json").unwrap();
            let err = storage.load::<Vec<u32>>(TASKS_KEY).unwrap_err();
            match err {
                Error::StorageUnavailable { key, .. } => assert_eq!(key, TASKS_KEY),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_path_like_keys() {
        let storage = Storage::in_memory();
        let err = storage.load::<Vec<u32>>("../etc").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn file_store_layout() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        store.write(SESSION_KEY, "\"user_demo\"").unwrap();
        assert!(dir.path().join("session.json").exists());
        assert_eq!(
            fs::read_to_string(store.blob_path(SESSION_KEY)).unwrap(),
            "\"user_demo\""
        );
    }

    #[test]
    fn file_store_update_times_out_when_locked() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path()).with_lock_timeout(50);
        let _held = FileLock::acquire(dir.path().join("tasks.lock"), 1000).unwrap();

        let err = store
            .update(TASKS_KEY, &mut |_| Ok(Some("[]".to_string())))
            .unwrap_err();
        assert!(matches!(err, Error::LockFailed(_)));
    }
}

//! In-memory backend for tests

use bytes::Bytes;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use super::{BlobStore, StorageError, StorageResult, validate_key};

/// Blobs in a map, with injectable put and delete failures.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<BTreeMap<String, Bytes>>,
    failing_deletes: Mutex<HashSet<String>>,
    flaky_deletes: Mutex<HashSet<String>>,
    failing_puts: Mutex<HashSet<String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `delete(key)` fail.
    pub fn fail_delete_of(&self, key: &str) {
        lock(&self.failing_deletes).insert(key.to_string());
    }

    /// Make only the next `delete(key)` fail.
    pub fn fail_next_delete_of(&self, key: &str) {
        lock(&self.flaky_deletes).insert(key.to_string());
    }

    /// Make every later `put(key, _)` fail.
    pub fn fail_put_of(&self, key: &str) {
        lock(&self.failing_puts).insert(key.to_string());
    }

    pub fn keys(&self) -> Vec<String> {
        lock(&self.blobs).keys().cloned().collect()
    }

    /// Seed a blob without going through `put`.
    pub fn insert(&self, key: &str, bytes: &'static [u8]) {
        lock(&self.blobs).insert(key.to_string(), Bytes::from_static(bytes));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Bytes) -> StorageResult<()> {
        validate_key(key)?;
        if lock(&self.failing_puts).contains(key) {
            return Err(StorageError::Backend(format!("injected put failure for {key}")));
        }
        lock(&self.blobs).insert(key.to_string(), bytes);
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Bytes>> {
        validate_key(key)?;
        Ok(lock(&self.blobs).get(key).cloned())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        if lock(&self.failing_deletes).contains(key) || lock(&self.flaky_deletes).remove(key) {
            return Err(StorageError::Backend(format!("injected delete failure for {key}")));
        }
        lock(&self.blobs).remove(key);
        Ok(())
    }

    async fn list_by_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        Ok(lock(&self.blobs)
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn public_url(&self, key: &str) -> String {
        format!("memory://{key}")
    }
}

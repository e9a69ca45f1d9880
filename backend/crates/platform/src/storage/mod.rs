//! Blob Storage
//!
//! The contract every attachment backend satisfies, plus the two backends
//! selectable by configuration:
//! - [`FsBlobStore`]: files in a local directory, served over HTTP by the API
//! - [`S3BlobStore`]: objects in an S3-compatible bucket
//!
//! Keys are flat names (no separators). Backends map them onto their own
//! namespace, so enumerating by key prefix always works.

mod backend;
mod fs;
#[cfg(any(test, feature = "testing"))]
mod memory;
mod s3;

pub use backend::BlobBackend;
pub use fs::FsBlobStore;
#[cfg(any(test, feature = "testing"))]
pub use memory::MemoryBlobStore;
pub use s3::S3BlobStore;

use bytes::Bytes;
use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid blob key: {0}")]
    InvalidKey(String),

    #[error("Blob I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Object store error: {0}")]
    Backend(String),
}

/// Blob storage contract
#[trait_variant::make(BlobStore: Send)]
pub trait LocalBlobStore {
    /// Store `bytes` under `key`, replacing any previous blob.
    async fn put(&self, key: &str, bytes: Bytes) -> StorageResult<()>;

    /// Read the blob under `key`, `None` when absent.
    async fn get(&self, key: &str) -> StorageResult<Option<Bytes>>;

    /// Remove `key`. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Every stored key starting with `prefix`, sorted.
    async fn list_by_prefix(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// URL a client can fetch the blob from.
    fn public_url(&self, key: &str) -> String;
}

/// Reject keys that could escape the backend's namespace.
pub fn validate_key(key: &str) -> StorageResult<()> {
    let bad = key.is_empty()
        || key.starts_with('.')
        || key.contains("..")
        || key.contains(['/', '\\', '\0']);

    if bad {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Reduce a client-supplied file name to something usable inside a key.
///
/// Keeps the final path component, replaces characters outside
/// `[A-Za-z0-9._-]` (Unicode letters and digits allowed) with `_`, and never
/// returns an empty, hidden or `..`-bearing name.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.').replace("..", "_");
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

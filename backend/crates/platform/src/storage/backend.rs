//! Configuration-selected backend

use bytes::Bytes;

use super::{BlobStore, FsBlobStore, S3BlobStore, StorageResult};

/// One of the supported backends, chosen at start-up.
#[derive(Clone)]
pub enum BlobBackend {
    Fs(FsBlobStore),
    S3(S3BlobStore),
}

impl BlobBackend {
    pub fn name(&self) -> &'static str {
        match self {
            BlobBackend::Fs(_) => "fs",
            BlobBackend::S3(_) => "s3",
        }
    }

    /// Directory to serve over HTTP, when the backend is local.
    pub fn served_root(&self) -> Option<&std::path::Path> {
        match self {
            BlobBackend::Fs(store) => Some(store.root()),
            BlobBackend::S3(_) => None,
        }
    }
}

impl BlobStore for BlobBackend {
    async fn put(&self, key: &str, bytes: Bytes) -> StorageResult<()> {
        match self {
            BlobBackend::Fs(store) => store.put(key, bytes).await,
            BlobBackend::S3(store) => store.put(key, bytes).await,
        }
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Bytes>> {
        match self {
            BlobBackend::Fs(store) => store.get(key).await,
            BlobBackend::S3(store) => store.get(key).await,
        }
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        match self {
            BlobBackend::Fs(store) => store.delete(key).await,
            BlobBackend::S3(store) => store.delete(key).await,
        }
    }

    async fn list_by_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        match self {
            BlobBackend::Fs(store) => store.list_by_prefix(prefix).await,
            BlobBackend::S3(store) => store.list_by_prefix(prefix).await,
        }
    }

    fn public_url(&self, key: &str) -> String {
        match self {
            BlobBackend::Fs(store) => store.public_url(key),
            BlobBackend::S3(store) => store.public_url(key),
        }
    }
}

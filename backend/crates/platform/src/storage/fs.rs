//! Local filesystem backend

use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::{BlobStore, StorageResult, validate_key};

/// Blobs as plain files in one directory.
///
/// The API serves `root` under the URL prefix given as `public_base_url`
/// (e.g. `http://host:31113/posts/get-file`).
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if needed. Called once at start-up.
    pub async fn ensure_root(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }
}

impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, bytes: Bytes) -> StorageResult<()> {
        validate_key(key)?;
        fs::create_dir_all(&self.root).await?;
        fs::write(self.root.join(key), &bytes).await?;
        tracing::debug!(key, size = bytes.len(), "Stored blob on disk");
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Bytes>> {
        validate_key(key)?;
        match fs::read(self.root.join(key)).await {
            Ok(bytes) => Ok(Some(Bytes::from(bytes))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        match fs::remove_file(self.root.join(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_by_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.starts_with(prefix) {
                    keys.push(name.to_string());
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;

    fn store(dir: &tempfile::TempDir) -> FsBlobStore {
        FsBlobStore::new(dir.path(), "http://localhost:31113/posts/get-file/")
    }

    #[tokio::test]
    async fn test_put_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        store.put("p1_0_a.jpg", Bytes::from_static(b"a")).await.unwrap();
        store.put("p1_1_b.jpg", Bytes::from_static(b"b")).await.unwrap();
        store.put("p2_0_c.jpg", Bytes::from_static(b"c")).await.unwrap();

        let keys = store.list_by_prefix("p1_").await.unwrap();
        assert_eq!(keys, vec!["p1_0_a.jpg", "p1_1_b.jpg"]);

        assert_eq!(
            store.get("p1_1_b.jpg").await.unwrap(),
            Some(Bytes::from_static(b"b"))
        );

        store.delete("p1_0_a.jpg").await.unwrap();
        assert!(store.get("p1_0_a.jpg").await.unwrap().is_none());
        assert_eq!(store.list_by_prefix("p1_").await.unwrap(), vec!["p1_1_b.jpg"]);
        assert_eq!(
            std::fs::read(dir.path().join("p2_0_c.jpg")).unwrap(),
            b"c".to_vec()
        );
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store(&dir).delete("nothing-here").await.is_ok());
    }

    #[tokio::test]
    async fn test_list_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path().join("not-created"), "http://x");
        assert!(store.list_by_prefix("p").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let result = store(&dir).put("../escape", Bytes::new()).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn test_public_url_trims_trailing_slash() {
        let store = FsBlobStore::new("/tmp", "http://localhost:31113/posts/get-file/");
        assert_eq!(
            store.public_url("p1_0_a.jpg"),
            "http://localhost:31113/posts/get-file/p1_0_a.jpg"
        );
    }
}

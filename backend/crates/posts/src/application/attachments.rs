//! Attachment Manager
//!
//! Keeps a post's `file_urls` in step with the blobs stored for it.
//! Blob keys are `{post_id}_{index}_{file name}`, so everything belonging
//! to a post can be enumerated by the `{post_id}_` prefix.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::future::join_all;
use kernel::id::PostId;
use platform::storage::{BlobStore, StorageResult, sanitize_file_name};
use tokio::task::JoinHandle;

use crate::domain::entity::post::MAX_POST_FILES;
use crate::domain::repository::PostRepository;
use crate::error::{PostError, PostResult};

/// Pause before the single retry of a failed blob delete
const DELETE_RETRY_DELAY: Duration = Duration::from_millis(100);

/// One file of a multipart upload
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Result of [`AttachmentManager::replace_all`]
#[derive(Debug)]
pub struct ReplaceOutput {
    /// URLs now stored on the post, in upload order
    pub file_urls: Vec<String>,
    /// Removal of the previous upload's leftovers
    pub cleanup: JoinHandle<()>,
}

pub struct AttachmentManager<P, B>
where
    P: PostRepository,
    B: BlobStore + Sync + 'static,
{
    post_repo: Arc<P>,
    blobs: Arc<B>,
}

impl<P, B> AttachmentManager<P, B>
where
    P: PostRepository,
    B: BlobStore + Sync + 'static,
{
    pub fn new(post_repo: Arc<P>, blobs: Arc<B>) -> Self {
        Self { post_repo, blobs }
    }

    /// Replace every file of a post.
    ///
    /// Blobs of the previous upload that this one does not overwrite are
    /// removed in the background. A file that fails to store is logged and
    /// left out of `file_urls`.
    ///
    /// Concurrent calls for the same post may interleave.
    pub async fn replace_all(
        &self,
        post_id: &PostId,
        files: Vec<UploadedFile>,
    ) -> PostResult<ReplaceOutput> {
        if files.len() > MAX_POST_FILES {
            return Err(PostError::TooManyFiles);
        }

        if !self.post_repo.clear_file_urls(post_id).await? {
            return Err(PostError::NotFound);
        }

        let prefix = key_prefix(post_id);
        let keys: Vec<String> = files
            .iter()
            .enumerate()
            .map(|(index, file)| file_key(post_id, index, &file.file_name))
            .collect();

        let previous = match self.blobs.list_by_prefix(&prefix).await {
            Ok(previous) => previous,
            Err(e) => {
                tracing::warn!(post_id = %post_id, error = %e, "Failed to enumerate previous files");
                Vec::new()
            }
        };
        let stale: Vec<String> = previous.into_iter().filter(|k| !keys.contains(k)).collect();
        let cleanup = spawn_removal(self.blobs.clone(), stale);

        let writes = keys
            .iter()
            .zip(files)
            .map(|(key, file)| self.blobs.put(key, file.bytes));
        let results = join_all(writes).await;

        let file_urls: Vec<String> = keys
            .iter()
            .zip(results)
            .filter_map(|(key, result)| match result {
                Ok(()) => Some(self.blobs.public_url(key)),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Failed to store post file");
                    None
                }
            })
            .collect();

        if !self.post_repo.append_file_urls(post_id, &file_urls).await? {
            // Deleted while uploading
            let _ = spawn_removal(self.blobs.clone(), keys);
            return Err(PostError::NotFound);
        }

        tracing::info!(post_id = %post_id, files = file_urls.len(), "Post files replaced");

        Ok(ReplaceOutput { file_urls, cleanup })
    }

    /// Remove every blob of a post in the background.
    pub fn delete_all(&self, post_id: &PostId) -> JoinHandle<()> {
        let blobs = self.blobs.clone();
        let prefix = key_prefix(post_id);

        tokio::spawn(async move { remove_by_prefix(blobs.as_ref(), &prefix).await })
    }

    /// Remove blobs whose post no longer exists. Run once at start-up to
    /// collect what failed deletes left behind; returns how many were found.
    ///
    /// Keys not starting with a post id are left alone.
    pub async fn sweep_orphans(&self) -> PostResult<usize> {
        let mut by_post: BTreeMap<PostId, Vec<String>> = BTreeMap::new();
        for key in self.blobs.list_by_prefix("").await? {
            let owner = key.split_once('_').and_then(|(id, _)| PostId::parse(id));
            if let Some(post_id) = owner {
                by_post.entry(post_id).or_default().push(key);
            }
        }

        let mut orphaned = 0;
        for (post_id, keys) in by_post {
            if self.post_repo.find_by_id(&post_id).await?.is_none() {
                orphaned += keys.len();
                remove_keys(self.blobs.as_ref(), keys).await;
            }
        }

        tracing::info!(orphaned, "Orphaned post files swept");
        Ok(orphaned)
    }
}

/// Enumerate and remove every blob under `prefix`. Failures are logged.
pub(crate) async fn remove_by_prefix<B>(blobs: &B, prefix: &str)
where
    B: BlobStore + Sync,
{
    match blobs.list_by_prefix(prefix).await {
        Ok(keys) => remove_keys(blobs, keys).await,
        Err(e) => tracing::warn!(prefix = %prefix, error = %e, "Failed to enumerate post files"),
    }
}

async fn remove_keys<B>(blobs: &B, keys: Vec<String>)
where
    B: BlobStore + Sync,
{
    for key in keys {
        match delete_with_retry(blobs, &key).await {
            Ok(()) => tracing::debug!(key = %key, "Post file deleted"),
            Err(e) => tracing::error!(key = %key, error = %e, "Post file left orphaned"),
        }
    }
}

async fn delete_with_retry<B>(blobs: &B, key: &str) -> StorageResult<()>
where
    B: BlobStore + Sync,
{
    if let Err(e) = blobs.delete(key).await {
        tracing::warn!(key = %key, error = %e, "Failed to delete post file, retrying");
        tokio::time::sleep(DELETE_RETRY_DELAY).await;
        return blobs.delete(key).await;
    }
    Ok(())
}

fn spawn_removal<B>(blobs: Arc<B>, keys: Vec<String>) -> JoinHandle<()>
where
    B: BlobStore + Sync + 'static,
{
    tokio::spawn(async move { remove_keys(blobs.as_ref(), keys).await })
}

pub fn key_prefix(post_id: &PostId) -> String {
    format!("{}_", post_id)
}

pub fn file_key(post_id: &PostId, index: usize, file_name: &str) -> String {
    format!("{}_{}_{}", post_id, index, sanitize_file_name(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_key_layout() {
        let post_id = PostId::new();
        let key = file_key(&post_id, 2, "photos/rupa.jpg");

        assert_eq!(key, format!("{}_2_rupa.jpg", post_id));
        assert!(key.starts_with(&key_prefix(&post_id)));
    }
}

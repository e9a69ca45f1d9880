//! ID Document Upload Use Case
//!
//! Stores a scan of the user's identity document in a dedicated blob store
//! and links it from the user's address. Previous documents are removed.
//! Reads go through [`ReadIdDocumentUseCase`] only; the store is never
//! served as static files.

use std::sync::Arc;

use bytes::Bytes;
use kernel::id::UserId;
use platform::storage::{BlobStore, StorageError, sanitize_file_name};

use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};

/// Uploaded document
pub struct IdDocumentInput {
    pub file_name: String,
    pub bytes: Bytes,
}

pub struct UploadIdDocumentUseCase<U, B>
where
    U: UserRepository,
    B: BlobStore + Sync + 'static,
{
    user_repo: Arc<U>,
    blobs: Arc<B>,
}

impl<U, B> UploadIdDocumentUseCase<U, B>
where
    U: UserRepository,
    B: BlobStore + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>, blobs: Arc<B>) -> Self {
        Self { user_repo, blobs }
    }

    /// Returns the public URL of the stored document.
    pub async fn execute(&self, user_id: &UserId, input: IdDocumentInput) -> AuthResult<String> {
        if self.user_repo.find_by_id(user_id).await?.is_none() {
            return Err(AuthError::UserNotFound);
        }

        let prefix = id_document_prefix(user_id);
        let key = format!("{}{}", prefix, sanitize_file_name(&input.file_name));

        let previous = self.blobs.list_by_prefix(&prefix).await?;
        self.blobs.put(&key, input.bytes).await?;
        let url = self.blobs.public_url(&key);

        if !self.user_repo.set_id_document(user_id, &url).await? {
            return Err(AuthError::UserNotFound);
        }

        for stale in previous.into_iter().filter(|k| *k != key) {
            if let Err(e) = self.blobs.delete(&stale).await {
                tracing::warn!(key = %stale, error = %e, "Failed to delete previous ID document");
            }
        }

        tracing::info!(user_id = %user_id, key = %key, "ID document uploaded");
        Ok(url)
    }
}

/// Stored document and its media type
pub struct IdDocument {
    pub content_type: String,
    pub bytes: Bytes,
}

pub struct ReadIdDocumentUseCase<B>
where
    B: BlobStore + Sync + 'static,
{
    blobs: Arc<B>,
}

impl<B> ReadIdDocumentUseCase<B>
where
    B: BlobStore + Sync + 'static,
{
    pub fn new(blobs: Arc<B>) -> Self {
        Self { blobs }
    }

    /// `key` is the last path segment of the URL returned on upload.
    pub async fn execute(&self, key: &str) -> AuthResult<IdDocument> {
        if !key.starts_with("id_") {
            return Err(AuthError::IdDocumentNotFound);
        }

        let bytes = match self.blobs.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) | Err(StorageError::InvalidKey(_)) => {
                return Err(AuthError::IdDocumentNotFound);
            }
            Err(e) => return Err(e.into()),
        };

        let content_type = mime_guess::from_path(key)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(IdDocument {
            content_type,
            bytes,
        })
    }
}

pub(crate) fn id_document_prefix(user_id: &UserId) -> String {
    format!("id_{}_", user_id)
}

//! Post Removal Use Cases
//!
//! Owner deletion and moderator denial. The row is deleted first; blob
//! cleanup and the rejection mail run afterwards in a spawned task whose
//! failures are only logged. The task handle is returned so callers may
//! wait for it; HTTP handlers drop it.

use std::sync::Arc;

use auth::UserRepository;
use kernel::id::{PostId, UserId};
use platform::mail::{Mailer, OutgoingMail};
use platform::storage::BlobStore;
use tokio::task::JoinHandle;

use crate::application::attachments::{AttachmentManager, key_prefix, remove_by_prefix};
use crate::application::config::PostsConfig;
use crate::domain::entity::post::Post;
use crate::domain::repository::PostRepository;
use crate::domain::value_object::outcome::OwnedWrite;
use crate::error::{PostError, PostResult};

// ============================================================================
// Delete (owner)
// ============================================================================

pub struct DeletePostUseCase<P, B>
where
    P: PostRepository,
    B: BlobStore + Sync + 'static,
{
    post_repo: Arc<P>,
    blobs: Arc<B>,
}

impl<P, B> DeletePostUseCase<P, B>
where
    P: PostRepository,
    B: BlobStore + Sync + 'static,
{
    pub fn new(post_repo: Arc<P>, blobs: Arc<B>) -> Self {
        Self { post_repo, blobs }
    }

    pub async fn execute(&self, post_id: &PostId, requester: &UserId) -> PostResult<JoinHandle<()>> {
        match self.post_repo.delete(post_id, Some(requester)).await? {
            OwnedWrite::Applied(post) => {
                tracing::info!(post_id = %post.post_id, "Post deleted by owner");

                let attachments = AttachmentManager::new(self.post_repo.clone(), self.blobs.clone());
                Ok(attachments.delete_all(post_id))
            }
            OwnedWrite::NotFound => Err(PostError::NotFound),
            OwnedWrite::Forbidden => Err(PostError::Forbidden),
        }
    }
}

// ============================================================================
// Deny (moderator)
// ============================================================================

pub struct DenyPostUseCase<P, U, B, M>
where
    P: PostRepository,
    U: UserRepository + Sync + 'static,
    B: BlobStore + Sync + 'static,
    M: Mailer + Sync + 'static,
{
    post_repo: Arc<P>,
    user_repo: Arc<U>,
    blobs: Arc<B>,
    mailer: Arc<M>,
    config: Arc<PostsConfig>,
}

impl<P, U, B, M> DenyPostUseCase<P, U, B, M>
where
    P: PostRepository,
    U: UserRepository + Sync + 'static,
    B: BlobStore + Sync + 'static,
    M: Mailer + Sync + 'static,
{
    pub fn new(
        post_repo: Arc<P>,
        user_repo: Arc<U>,
        blobs: Arc<B>,
        mailer: Arc<M>,
        config: Arc<PostsConfig>,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            blobs,
            mailer,
            config,
        }
    }

    /// Ownership is not checked; the caller's moderator role is.
    pub async fn execute(&self, post_id: &PostId, moderator_id: &UserId) -> PostResult<JoinHandle<()>> {
        let post = match self.post_repo.delete(post_id, None).await? {
            OwnedWrite::Applied(post) => post,
            OwnedWrite::NotFound => return Err(PostError::NotFound),
            OwnedWrite::Forbidden => return Err(PostError::Forbidden),
        };

        tracing::info!(
            post_id = %post.post_id,
            moderator_id = %moderator_id,
            "Post denied"
        );

        let blobs = self.blobs.clone();
        let users = self.user_repo.clone();
        let mailer = self.mailer.clone();
        let config = self.config.clone();
        let prefix = key_prefix(post_id);

        Ok(tokio::spawn(async move {
            tokio::join!(
                remove_by_prefix(blobs.as_ref(), &prefix),
                send_rejection_notice(users.as_ref(), mailer.as_ref(), &config, &post),
            );
        }))
    }
}

async fn send_rejection_notice<U, M>(users: &U, mailer: &M, config: &PostsConfig, post: &Post)
where
    U: UserRepository + Sync,
    M: Mailer + Sync,
{
    let email = match users.find_email(&post.owner_id).await {
        Ok(Some(email)) => email,
        Ok(None) => {
            tracing::warn!(owner_id = %post.owner_id, "Owner of denied post no longer exists");
            return;
        }
        Err(e) => {
            tracing::warn!(owner_id = %post.owner_id, error = %e, "Failed to look up post owner");
            return;
        }
    };

    let mail = OutgoingMail {
        to: email.as_str().to_string(),
        subject: config.rejection_subject.clone(),
        body: config.rejection_body_for(&post.title),
    };

    match mailer.send(mail).await {
        Ok(()) => tracing::debug!(post_id = %post.post_id, "Rejection notice sent"),
        Err(e) => tracing::warn!(post_id = %post.post_id, error = %e, "Failed to send rejection notice"),
    }
}

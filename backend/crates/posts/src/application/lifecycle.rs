//! Post Lifecycle Use Cases
//!
//! Creation, owner edits, status transitions, moderation approval and
//! lookup. Removal lives in [`super::removal`].

use std::sync::Arc;

use auth::UserRepository;
use kernel::id::{PostId, UserId};

use crate::application::config::PostsConfig;
use crate::domain::entity::post::Post;
use crate::domain::repository::PostRepository;
use crate::domain::value_object::outcome::OwnedWrite;
use crate::domain::value_object::post_status::PostStatus;
use crate::error::{PostError, PostResult};

// ============================================================================
// Create
// ============================================================================

/// Create post input
pub struct CreatePostInput {
    pub title: String,
    pub description: String,
    pub city: String,
}

/// Create post use case
pub struct CreatePostUseCase<P, U>
where
    P: PostRepository,
    U: UserRepository,
{
    post_repo: Arc<P>,
    user_repo: Arc<U>,
    config: Arc<PostsConfig>,
}

impl<P, U> CreatePostUseCase<P, U>
where
    P: PostRepository,
    U: UserRepository,
{
    pub fn new(post_repo: Arc<P>, user_repo: Arc<U>, config: Arc<PostsConfig>) -> Self {
        Self {
            post_repo,
            user_repo,
            config,
        }
    }

    pub async fn execute(&self, owner_id: &UserId, input: CreatePostInput) -> PostResult<PostId> {
        if !self.user_repo.is_verified(owner_id).await? {
            return Err(PostError::Unauthorized);
        }

        let title = required_text("title", input.title, self.config.max_title_length)?;
        let description = required_text(
            "description",
            input.description,
            self.config.max_description_length,
        )?;
        let city = required_text("city", input.city, self.config.max_title_length)?;

        let post = Post::new(title, description, *owner_id, city);
        self.post_repo.insert(&post).await?;

        tracing::info!(
            post_id = %post.post_id,
            owner_id = %owner_id,
            city = %post.city,
            "Post created"
        );

        Ok(post.post_id)
    }
}

// ============================================================================
// Edit
// ============================================================================

/// Edit post input
pub struct EditPostInput {
    pub title: String,
    pub description: String,
}

/// Owner-only edit of title and description
pub struct EditPostUseCase<P>
where
    P: PostRepository,
{
    post_repo: Arc<P>,
    config: Arc<PostsConfig>,
}

impl<P> EditPostUseCase<P>
where
    P: PostRepository,
{
    pub fn new(post_repo: Arc<P>, config: Arc<PostsConfig>) -> Self {
        Self { post_repo, config }
    }

    pub async fn execute(
        &self,
        post_id: &PostId,
        requester: &UserId,
        input: EditPostInput,
    ) -> PostResult<()> {
        let title = required_text("title", input.title, self.config.max_title_length)?;
        let description = required_text(
            "description",
            input.description,
            self.config.max_description_length,
        )?;

        match self
            .post_repo
            .update_content(post_id, requester, &title, &description)
            .await?
        {
            OwnedWrite::Applied(()) => {
                tracing::info!(post_id = %post_id, "Post edited");
                Ok(())
            }
            OwnedWrite::NotFound => Err(PostError::NotFound),
            OwnedWrite::Forbidden => Err(PostError::Forbidden),
        }
    }
}

// ============================================================================
// Status / Verification
// ============================================================================

/// Unconditional status overwrite; any status may follow any other
pub struct ChangeStatusUseCase<P>
where
    P: PostRepository,
{
    post_repo: Arc<P>,
}

impl<P> ChangeStatusUseCase<P>
where
    P: PostRepository,
{
    pub fn new(post_repo: Arc<P>) -> Self {
        Self { post_repo }
    }

    /// Takes the raw request values: an unknown status is rejected before
    /// the id is looked at, and a malformed id is simply not found.
    pub async fn execute(&self, post_id: &str, status: &str) -> PostResult<PostStatus> {
        let status: PostStatus = status.parse()?;
        let post_id = PostId::parse(post_id).ok_or(PostError::NotFound)?;

        if !self.post_repo.set_status(&post_id, status).await? {
            return Err(PostError::NotFound);
        }

        tracing::info!(post_id = %post_id, status = %status, "Post status changed");
        Ok(status)
    }
}

/// Moderation approval. Idempotent.
pub struct VerifyPostUseCase<P>
where
    P: PostRepository,
{
    post_repo: Arc<P>,
}

impl<P> VerifyPostUseCase<P>
where
    P: PostRepository,
{
    pub fn new(post_repo: Arc<P>) -> Self {
        Self { post_repo }
    }

    pub async fn execute(&self, post_id: &PostId) -> PostResult<()> {
        if !self.post_repo.set_verified(post_id).await? {
            return Err(PostError::NotFound);
        }

        tracing::info!(post_id = %post_id, "Post approved");
        Ok(())
    }
}

// ============================================================================
// Get
// ============================================================================

pub struct GetPostUseCase<P>
where
    P: PostRepository,
{
    post_repo: Arc<P>,
}

impl<P> GetPostUseCase<P>
where
    P: PostRepository,
{
    pub fn new(post_repo: Arc<P>) -> Self {
        Self { post_repo }
    }

    pub async fn execute(&self, post_id: &PostId) -> PostResult<Post> {
        self.post_repo
            .find_by_id(post_id)
            .await?
            .ok_or(PostError::NotFound)
    }
}

fn required_text(field: &str, value: String, max_length: usize) -> PostResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PostError::InvalidArgument(format!("{} cannot be empty", field)));
    }
    if value.chars().count() > max_length {
        return Err(PostError::InvalidArgument(format!(
            "{} must be at most {} characters",
            field, max_length
        )));
    }
    Ok(value.to_string())
}

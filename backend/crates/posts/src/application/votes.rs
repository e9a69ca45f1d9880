//! Vote/Favourite Aggregator
//!
//! Upvote and downvote exclude each other; favourite stands alone. Each
//! toggle is one atomic mutation in the Post store.

use std::sync::Arc;

use kernel::id::{PostId, UserId};

use crate::domain::repository::PostRepository;
use crate::domain::value_object::outcome::{FavouriteOutcome, VoteKind, VoteOutcome};
use crate::error::{PostError, PostResult};

pub struct VoteUseCase<P>
where
    P: PostRepository,
{
    post_repo: Arc<P>,
}

impl<P> VoteUseCase<P>
where
    P: PostRepository,
{
    pub fn new(post_repo: Arc<P>) -> Self {
        Self { post_repo }
    }

    pub async fn upvote(&self, post_id: &PostId, user_id: &UserId) -> PostResult<VoteOutcome> {
        self.vote(post_id, user_id, VoteKind::Up).await
    }

    pub async fn downvote(&self, post_id: &PostId, user_id: &UserId) -> PostResult<VoteOutcome> {
        self.vote(post_id, user_id, VoteKind::Down).await
    }

    pub async fn vote(
        &self,
        post_id: &PostId,
        user_id: &UserId,
        kind: VoteKind,
    ) -> PostResult<VoteOutcome> {
        let outcome = self
            .post_repo
            .toggle_vote(post_id, user_id, kind)
            .await?
            .ok_or(PostError::NotFound)?;

        tracing::debug!(
            post_id = %post_id,
            user_id = %user_id,
            outcome = ?outcome,
            "Vote toggled"
        );
        Ok(outcome)
    }

    pub async fn favourite(
        &self,
        post_id: &PostId,
        user_id: &UserId,
    ) -> PostResult<FavouriteOutcome> {
        let outcome = self
            .post_repo
            .toggle_favourite(post_id, user_id)
            .await?
            .ok_or(PostError::NotFound)?;

        tracing::debug!(
            post_id = %post_id,
            user_id = %user_id,
            outcome = ?outcome,
            "Favourite toggled"
        );
        Ok(outcome)
    }
}

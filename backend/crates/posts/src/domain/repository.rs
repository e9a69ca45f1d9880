//! Repository Traits
//!
//! Post store interface. Every mutation is a single atomic operation in the
//! store; no caller reads a post, edits it and writes it back.

use kernel::id::{PostId, UserId};

use crate::domain::entity::post::Post;
use crate::domain::value_object::outcome::{FavouriteOutcome, OwnedWrite, VoteKind, VoteOutcome};
use crate::domain::value_object::post_sort::PostSort;
use crate::domain::value_object::post_status::PostStatus;
use crate::error::PostResult;

/// Which posts a listing covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    /// Every approved post
    Verified,
    /// Approved posts of one city
    VerifiedInCity(String),
    /// Posts awaiting moderation in one city
    UnverifiedInCity(String),
    /// Everything a user reported, approved or not
    OwnedBy(UserId),
    /// Everything a user marked as favourite
    FavouriteOf(UserId),
}

/// `offset` posts skipped, at most `limit` returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: i64,
    pub limit: i64,
}

/// Post repository trait
#[trait_variant::make(PostRepository: Send)]
pub trait LocalPostRepository {
    async fn insert(&self, post: &Post) -> PostResult<()>;

    async fn find_by_id(&self, post_id: &PostId) -> PostResult<Option<Post>>;

    /// Replace title and description if `requester` owns the post.
    async fn update_content(
        &self,
        post_id: &PostId,
        requester: &UserId,
        title: &str,
        description: &str,
    ) -> PostResult<OwnedWrite>;

    /// `false` when the post does not exist.
    async fn set_status(&self, post_id: &PostId, status: PostStatus) -> PostResult<bool>;

    /// `false` when the post does not exist.
    async fn set_verified(&self, post_id: &PostId) -> PostResult<bool>;

    /// Delete a post and every back-reference to it. With a requester,
    /// only its owner may delete it. Returns the deleted post.
    async fn delete(&self, post_id: &PostId, requester: Option<&UserId>)
    -> PostResult<OwnedWrite<Post>>;

    /// Toggle a vote and the voter's back-reference. `None` when the post
    /// does not exist.
    async fn toggle_vote(
        &self,
        post_id: &PostId,
        user_id: &UserId,
        kind: VoteKind,
    ) -> PostResult<Option<VoteOutcome>>;

    /// Toggle a favourite and the user's back-reference. `None` when the
    /// post does not exist.
    async fn toggle_favourite(
        &self,
        post_id: &PostId,
        user_id: &UserId,
    ) -> PostResult<Option<FavouriteOutcome>>;

    /// Empty `file_urls`. `false` when the post does not exist.
    async fn clear_file_urls(&self, post_id: &PostId) -> PostResult<bool>;

    /// Append to `file_urls` in order. `false` when the post does not exist.
    async fn append_file_urls(&self, post_id: &PostId, urls: &[String]) -> PostResult<bool>;

    async fn list(
        &self,
        filter: &PostFilter,
        sort: PostSort,
        window: Option<Window>,
    ) -> PostResult<Vec<Post>>;

    async fn count(&self, filter: &PostFilter) -> PostResult<i64>;
}

//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use kernel::id::{PostId, UserId};
use serde::{Deserialize, Serialize};

use crate::domain::entity::post::Post;
use crate::domain::value_object::outcome::{FavouriteOutcome, VoteKind, VoteOutcome};
use crate::domain::value_object::page::PageRequest;
use crate::domain::value_object::post_status::PostStatus;

// ============================================================================
// Lifecycle
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub description: String,
    pub city: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostResponse {
    pub post_id: PostId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditPostRequest {
    pub title: String,
    pub description: String,
}

/// Status is kept as text so unknown values get a proper error
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatusRequest {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUrlsResponse {
    pub file_urls: Vec<String>,
}

// ============================================================================
// Toggles
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub outcome: VoteOutcome,
    pub message: String,
}

impl VoteResponse {
    pub fn new(outcome: VoteOutcome, kind: VoteKind) -> Self {
        Self {
            message: outcome.message(kind),
            outcome,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavouriteResponse {
    pub outcome: FavouriteOutcome,
    pub message: &'static str,
}

impl From<FavouriteOutcome> for FavouriteResponse {
    fn from(outcome: FavouriteOutcome) -> Self {
        Self {
            message: outcome.message(),
            outcome,
        }
    }
}

// ============================================================================
// Listings
// ============================================================================

/// `?page=&limit=&sort=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
}

/// `?sort=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SortQuery {
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: PostId,
    pub title: String,
    pub description: String,
    /// Owner
    pub user: UserId,
    pub city: String,
    pub status: PostStatus,
    pub upvotes: Vec<UserId>,
    pub downvotes: Vec<UserId>,
    pub favourite_by: Vec<UserId>,
    pub file_urls: Vec<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.post_id,
            title: post.title,
            description: post.description,
            user: post.owner_id,
            city: post.city,
            status: post.status,
            upvotes: post.upvoted_by,
            downvotes: post.downvoted_by,
            favourite_by: post.favourite_by,
            file_urls: post.file_urls,
            verified: post.verified,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

pub fn post_responses(posts: Vec<Post>) -> Vec<PostResponse> {
    posts.into_iter().map(PostResponse::from).collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPageResponse {
    pub posts: Vec<PostResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<PageRequest>,
}

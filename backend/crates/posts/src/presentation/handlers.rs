//! HTTP Handlers

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use std::sync::Arc;

use auth::{AuthUser, UserRepository, UserRole};
use kernel::id::PostId;
use platform::mail::Mailer;
use platform::storage::BlobStore;

use crate::application::config::PostsConfig;
use crate::application::{
    AttachmentManager, ChangeStatusUseCase, CreatePostInput, CreatePostUseCase, DeletePostUseCase,
    DenyPostUseCase, EditPostInput, EditPostUseCase, GetPostUseCase, ListPostsUseCase,
    UploadedFile, VerifyPostUseCase, VoteUseCase,
};
use crate::domain::entity::post::MAX_POST_FILES;
use crate::domain::repository::PostRepository;
use crate::domain::value_object::outcome::VoteKind;
use crate::domain::value_object::page::PageRequest;
use crate::domain::value_object::post_sort::PostSort;
use crate::error::{PostError, PostResult};
use crate::presentation::dto::{
    ChangeStatusRequest, CreatePostRequest, CreatePostResponse, EditPostRequest,
    FavouriteResponse, FileUrlsResponse, ListQuery, PostPageResponse, PostResponse, SortQuery,
    VoteResponse, post_responses,
};

/// Shared state for `/posts` handlers
pub struct PostAppState<P, U, B, M>
where
    P: PostRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    pub posts: Arc<P>,
    pub users: Arc<U>,
    pub blobs: Arc<B>,
    pub mailer: Arc<M>,
    pub config: Arc<PostsConfig>,
}

impl<P, U, B, M> Clone for PostAppState<P, U, B, M>
where
    P: PostRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            posts: self.posts.clone(),
            users: self.users.clone(),
            blobs: self.blobs.clone(),
            mailer: self.mailer.clone(),
            config: self.config.clone(),
        }
    }
}

/// A malformed id names no post
fn parse_post_id(raw: &str) -> PostResult<PostId> {
    PostId::parse(raw).ok_or(PostError::NotFound)
}

// ============================================================================
// Lifecycle
// ============================================================================

/// POST /posts/create
pub async fn create_post<P, U, B, M>(
    State(state): State<PostAppState<P, U, B, M>>,
    caller: AuthUser,
    Json(req): Json<CreatePostRequest>,
) -> PostResult<impl IntoResponse>
where
    P: PostRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let use_case = CreatePostUseCase::new(
        state.posts.clone(),
        state.users.clone(),
        state.config.clone(),
    );

    let post_id = use_case
        .execute(
            &caller.user_id,
            CreatePostInput {
                title: req.title,
                description: req.description,
                city: req.city,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(CreatePostResponse { post_id })))
}

/// POST /posts/create/files/{postId}
///
/// Every file field of the form counts, whatever its name.
pub async fn upload_files<P, U, B, M>(
    State(state): State<PostAppState<P, U, B, M>>,
    caller: AuthUser,
    Path(post_id): Path<String>,
    mut multipart: Multipart,
) -> PostResult<Json<FileUrlsResponse>>
where
    P: PostRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let post_id = parse_post_id(&post_id)?;

    let post = GetPostUseCase::new(state.posts.clone())
        .execute(&post_id)
        .await?;
    if !post.is_owned_by(&caller.user_id) {
        return Err(PostError::Forbidden);
    }

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PostError::InvalidArgument(e.body_text()))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if files.len() == MAX_POST_FILES {
            return Err(PostError::TooManyFiles);
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| PostError::InvalidArgument(e.body_text()))?;
        files.push(UploadedFile { file_name, bytes });
    }

    let manager = AttachmentManager::new(state.posts.clone(), state.blobs.clone());
    let output = manager.replace_all(&post_id, files).await?;

    Ok(Json(FileUrlsResponse {
        file_urls: output.file_urls,
    }))
}

/// PUT /posts/approve/{id}
pub async fn approve_post<P, U, B, M>(
    State(state): State<PostAppState<P, U, B, M>>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> PostResult<StatusCode>
where
    P: PostRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    caller.require_role(UserRole::Moderator)?;
    let post_id = parse_post_id(&id)?;

    VerifyPostUseCase::new(state.posts.clone())
        .execute(&post_id)
        .await?;

    Ok(StatusCode::OK)
}

/// PUT /posts/deny/{id}
pub async fn deny_post<P, U, B, M>(
    State(state): State<PostAppState<P, U, B, M>>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> PostResult<StatusCode>
where
    P: PostRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    caller.require_role(UserRole::Moderator)?;
    let post_id = parse_post_id(&id)?;

    let use_case = DenyPostUseCase::new(
        state.posts.clone(),
        state.users.clone(),
        state.blobs.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );
    // Cleanup and mail finish in the background
    let _ = use_case.execute(&post_id, &caller.user_id).await?;

    Ok(StatusCode::OK)
}

/// PUT /posts/edit/{id}
pub async fn edit_post<P, U, B, M>(
    State(state): State<PostAppState<P, U, B, M>>,
    caller: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<EditPostRequest>,
) -> PostResult<StatusCode>
where
    P: PostRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let post_id = parse_post_id(&id)?;

    EditPostUseCase::new(state.posts.clone(), state.config.clone())
        .execute(
            &post_id,
            &caller.user_id,
            EditPostInput {
                title: req.title,
                description: req.description,
            },
        )
        .await?;

    Ok(StatusCode::OK)
}

/// PUT /posts/status
pub async fn change_status<P, U, B, M>(
    State(state): State<PostAppState<P, U, B, M>>,
    caller: AuthUser,
    Json(req): Json<ChangeStatusRequest>,
) -> PostResult<StatusCode>
where
    P: PostRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    caller.require_role(UserRole::LocalAdmin)?;

    ChangeStatusUseCase::new(state.posts.clone())
        .execute(&req.id, &req.status)
        .await?;

    Ok(StatusCode::OK)
}

/// DELETE /posts/{id}
pub async fn delete_post<P, U, B, M>(
    State(state): State<PostAppState<P, U, B, M>>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> PostResult<StatusCode>
where
    P: PostRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let post_id = parse_post_id(&id)?;

    let _ = DeletePostUseCase::new(state.posts.clone(), state.blobs.clone())
        .execute(&post_id, &caller.user_id)
        .await?;

    Ok(StatusCode::OK)
}

/// GET /posts/{id}
pub async fn get_post<P, U, B, M>(
    State(state): State<PostAppState<P, U, B, M>>,
    Path(id): Path<String>,
) -> PostResult<Json<PostResponse>>
where
    P: PostRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let post_id = parse_post_id(&id)?;
    let post = GetPostUseCase::new(state.posts.clone())
        .execute(&post_id)
        .await?;

    Ok(Json(post.into()))
}

// ============================================================================
// Toggles
// ============================================================================

async fn toggle_vote<P, U, B, M>(
    state: PostAppState<P, U, B, M>,
    caller: AuthUser,
    post_id: &str,
    kind: VoteKind,
) -> PostResult<Json<VoteResponse>>
where
    P: PostRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    caller.require_role(UserRole::User)?;
    let post_id = parse_post_id(post_id)?;

    let outcome = VoteUseCase::new(state.posts.clone())
        .vote(&post_id, &caller.user_id, kind)
        .await?;

    Ok(Json(VoteResponse::new(outcome, kind)))
}

/// PUT /posts/upvote/{postId}
pub async fn upvote<P, U, B, M>(
    State(state): State<PostAppState<P, U, B, M>>,
    caller: AuthUser,
    Path(post_id): Path<String>,
) -> PostResult<Json<VoteResponse>>
where
    P: PostRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    toggle_vote(state, caller, &post_id, VoteKind::Up).await
}

/// PUT /posts/downvote/{postId}
pub async fn downvote<P, U, B, M>(
    State(state): State<PostAppState<P, U, B, M>>,
    caller: AuthUser,
    Path(post_id): Path<String>,
) -> PostResult<Json<VoteResponse>>
where
    P: PostRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    toggle_vote(state, caller, &post_id, VoteKind::Down).await
}

/// PUT /posts/favourite/{postId}
pub async fn favourite<P, U, B, M>(
    State(state): State<PostAppState<P, U, B, M>>,
    caller: AuthUser,
    Path(post_id): Path<String>,
) -> PostResult<Json<FavouriteResponse>>
where
    P: PostRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    caller.require_role(UserRole::User)?;
    let post_id = parse_post_id(&post_id)?;

    let outcome = VoteUseCase::new(state.posts.clone())
        .favourite(&post_id, &caller.user_id)
        .await?;

    Ok(Json(outcome.into()))
}

// ============================================================================
// Listings
// ============================================================================

/// GET /posts/all?page&limit&sort
pub async fn list_all<P, U, B, M>(
    State(state): State<PostAppState<P, U, B, M>>,
    Query(query): Query<ListQuery>,
) -> PostResult<Json<PostPageResponse>>
where
    P: PostRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let page = PageRequest::from_query(query.page, query.limit)?;
    let sort = PostSort::parse(query.sort.as_deref())?;

    let result = ListPostsUseCase::new(state.posts.clone(), state.users.clone())
        .list_all(page, sort)
        .await?;

    Ok(Json(PostPageResponse {
        posts: post_responses(result.posts),
        next: result.links.next,
        previous: result.links.previous,
    }))
}

/// GET /posts/city/{city}?sort
pub async fn list_by_city<P, U, B, M>(
    State(state): State<PostAppState<P, U, B, M>>,
    Path(city): Path<String>,
    Query(query): Query<SortQuery>,
) -> PostResult<Json<Vec<PostResponse>>>
where
    P: PostRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let sort = PostSort::parse(query.sort.as_deref())?;
    let posts = ListPostsUseCase::new(state.posts.clone(), state.users.clone())
        .list_by_city(&city, sort)
        .await?;

    Ok(Json(post_responses(posts)))
}

/// GET /posts/user/all
pub async fn list_own<P, U, B, M>(
    State(state): State<PostAppState<P, U, B, M>>,
    caller: AuthUser,
) -> PostResult<Json<Vec<PostResponse>>>
where
    P: PostRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let posts = ListPostsUseCase::new(state.posts.clone(), state.users.clone())
        .list_by_user(&caller.user_id)
        .await?;

    Ok(Json(post_responses(posts)))
}

/// GET /posts/favourites
pub async fn list_favourites<P, U, B, M>(
    State(state): State<PostAppState<P, U, B, M>>,
    caller: AuthUser,
) -> PostResult<Json<Vec<PostResponse>>>
where
    P: PostRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let posts = ListPostsUseCase::new(state.posts.clone(), state.users.clone())
        .list_favourites(&caller.user_id)
        .await?;

    Ok(Json(post_responses(posts)))
}

/// GET /posts/unverified
pub async fn list_unverified<P, U, B, M>(
    State(state): State<PostAppState<P, U, B, M>>,
    caller: AuthUser,
) -> PostResult<Json<Vec<PostResponse>>>
where
    P: PostRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    caller.require_role(UserRole::Moderator)?;

    let posts = ListPostsUseCase::new(state.posts.clone(), state.users.clone())
        .list_unverified_for_moderator(&caller.user_id)
        .await?;

    Ok(Json(post_responses(posts)))
}

//! Posts Router

use auth::{AuthConfig, AuthMiddlewareState, PgAuthRepository, UserRepository, require_bearer};
use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use platform::mail::{MailBackend, Mailer};
use platform::storage::{BlobBackend, BlobStore};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::application::config::PostsConfig;
use crate::domain::repository::PostRepository;
use crate::infra::postgres::PgPostRepository;
use crate::presentation::handlers::{self, PostAppState};

/// Create the `/posts` router with the PostgreSQL repositories
pub fn posts_router(
    post_repo: PgPostRepository,
    user_repo: PgAuthRepository,
    blobs: Arc<BlobBackend>,
    mailer: Arc<MailBackend>,
    auth_config: Arc<AuthConfig>,
    config: Arc<PostsConfig>,
) -> Router {
    let files_root = blobs.served_root().map(PathBuf::from);
    posts_router_generic(
        post_repo,
        Arc::new(user_repo),
        blobs,
        mailer,
        auth_config,
        config,
        files_root,
    )
}

/// Create a generic `/posts` router.
///
/// `files_root` is served under `/get-file` when blobs live on local disk.
pub fn posts_router_generic<P, U, B, M>(
    post_repo: P,
    user_repo: Arc<U>,
    blobs: Arc<B>,
    mailer: Arc<M>,
    auth_config: Arc<AuthConfig>,
    config: Arc<PostsConfig>,
    files_root: Option<PathBuf>,
) -> Router
where
    P: PostRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let state = PostAppState {
        posts: Arc::new(post_repo),
        users: user_repo.clone(),
        blobs,
        mailer,
        config,
    };
    let auth_state = AuthMiddlewareState {
        repo: user_repo,
        config: auth_config,
    };

    let protected = Router::new()
        .route("/create", post(handlers::create_post::<P, U, B, M>))
        .route(
            "/create/files/{post_id}",
            post(handlers::upload_files::<P, U, B, M>),
        )
        .route("/approve/{id}", put(handlers::approve_post::<P, U, B, M>))
        .route("/deny/{id}", put(handlers::deny_post::<P, U, B, M>))
        .route("/edit/{id}", put(handlers::edit_post::<P, U, B, M>))
        .route("/status", put(handlers::change_status::<P, U, B, M>))
        .route("/upvote/{post_id}", put(handlers::upvote::<P, U, B, M>))
        .route("/downvote/{post_id}", put(handlers::downvote::<P, U, B, M>))
        .route("/favourite/{post_id}", put(handlers::favourite::<P, U, B, M>))
        .route("/user/all", get(handlers::list_own::<P, U, B, M>))
        .route("/favourites", get(handlers::list_favourites::<P, U, B, M>))
        .route("/unverified", get(handlers::list_unverified::<P, U, B, M>))
        .route("/{id}", delete(handlers::delete_post::<P, U, B, M>))
        .route_layer(middleware::from_fn_with_state(auth_state, require_bearer::<U>));

    let mut public = Router::new()
        .route("/all", get(handlers::list_all::<P, U, B, M>))
        .route("/city/{city}", get(handlers::list_by_city::<P, U, B, M>))
        .route("/{id}", get(handlers::get_post::<P, U, B, M>));

    if let Some(root) = files_root {
        public = public.nest_service("/get-file", ServeDir::new(root));
    }

    public.merge(protected).with_state(state)
}

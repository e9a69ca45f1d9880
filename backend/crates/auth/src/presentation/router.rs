//! Users Router

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use platform::storage::{BlobBackend, BlobStore};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::repository::UserRepository;
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{AuthMiddlewareState, require_bearer};

/// Create the `/users` router with the PostgreSQL repository
///
/// `id_documents` must not be the store post attachments are served from.
pub fn users_router(
    repo: PgAuthRepository,
    id_documents: Arc<BlobBackend>,
    config: Arc<AuthConfig>,
) -> Router {
    users_router_generic(repo, id_documents, config)
}

/// Create a generic `/users` router for any repository and blob store
pub fn users_router_generic<R, B>(
    repo: R,
    id_documents: Arc<B>,
    config: Arc<AuthConfig>,
) -> Router
where
    R: UserRepository + Send + Sync + 'static,
    B: BlobStore + Send + Sync + 'static,
{
    let repo = Arc::new(repo);
    let state = AuthAppState {
        repo: repo.clone(),
        id_documents,
        config: config.clone(),
    };
    let auth_state = AuthMiddlewareState { repo, config };

    let protected = Router::new()
        .route("/me", get(handlers::me::<R, B>))
        .route("/register/id", post(handlers::upload_id_document::<R, B>))
        .route("/id-documents/{key}", get(handlers::id_document::<R, B>))
        .route("/verify/{id}", put(handlers::verify_address::<R, B>))
        .route_layer(middleware::from_fn_with_state(auth_state, require_bearer::<R>));

    Router::new()
        .route("/register", post(handlers::register::<R, B>))
        .route("/login", post(handlers::login::<R, B>))
        .route("/profile-pic/{id}", get(handlers::profile_pic::<R, B>))
        .merge(protected)
        .with_state(state)
}

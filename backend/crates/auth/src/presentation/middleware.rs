//! Auth Middleware
//!
//! Bearer-token authentication for protected routes and the role guard
//! handlers apply afterwards.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use kernel::id::UserId;
use platform::bearer::extract_bearer_token;
use std::sync::Arc;

use crate::application::AuthenticateUseCase;
use crate::application::config::AuthConfig;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::user_role::UserRole;
use crate::error::{AuthError, AuthResult};

/// Authenticated caller, inserted into request extensions by [`require_bearer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: UserId,
    pub role: UserRole,
}

impl AuthUser {
    /// Roles are distinct scopes: only an exact match passes.
    pub fn require_role(&self, required: UserRole) -> AuthResult<()> {
        if self.role == required {
            Ok(())
        } else {
            Err(AuthError::InsufficientRole { required })
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or(AuthError::TokenMissing)
    }
}

/// Middleware state
pub struct AuthMiddlewareState<R>
where
    R: UserRepository + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
}

impl<R> Clone for AuthMiddlewareState<R>
where
    R: UserRepository + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
        }
    }
}

/// Middleware that requires a valid bearer token
pub async fn require_bearer<R>(
    State(state): State<AuthMiddlewareState<R>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: UserRepository + Send + Sync + 'static,
{
    // Owned: the request body is not `Sync`, so no borrow may cross the await
    let token = extract_bearer_token(req.headers())
        .map(str::to_owned)
        .ok_or(AuthError::TokenMissing)?;

    let use_case = AuthenticateUseCase::new(state.repo.clone(), state.config.clone());
    let user = use_case.execute(&token).await?;

    req.extensions_mut().insert(AuthUser {
        user_id: user.user_id,
        role: user.role,
    });

    Ok(next.run(req).await)
}

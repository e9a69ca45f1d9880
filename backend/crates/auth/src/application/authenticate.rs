//! Authenticate Use Case
//!
//! Resolves a bearer token to the caller's identity and role.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token::TokenService;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};

pub struct AuthenticateUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    tokens: TokenService,
}

impl<U> AuthenticateUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            tokens: TokenService::new(config),
        }
    }

    pub async fn execute(&self, token: &str) -> AuthResult<User> {
        let user_id = self.tokens.verify(token)?;

        // Role is read per request so promotions apply immediately
        self.user_repo
            .find_by_id(&user_id)
            .await?
            .ok_or(AuthError::TokenInvalid)
    }
}

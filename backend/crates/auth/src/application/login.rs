//! Login Use Case
//!
//! Exchanges email and password for a bearer token.

use std::sync::Arc;

use kernel::id::UserId;

use crate::application::config::AuthConfig;
use crate::application::token::{IssuedToken, TokenService};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

/// Login input
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Login output
pub struct LoginOutput {
    pub user_id: UserId,
    pub token: IssuedToken,
}

/// Login use case
pub struct LoginUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    config: Arc<AuthConfig>,
}

impl<U> LoginUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, config: Arc<AuthConfig>) -> Self {
        Self { user_repo, config }
    }

    pub async fn execute(&self, input: LoginInput) -> AuthResult<LoginOutput> {
        // A malformed address cannot belong to anybody
        let email = Email::new(input.email).map_err(|_| AuthError::UserNotFound)?;

        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let raw_password = RawPassword::for_login(input.password);
        if !user.password.verify(&raw_password, self.config.pepper()) {
            return Err(AuthError::WrongPassword);
        }

        tracing::info!(user_id = %user.user_id, "User logged in");

        let token = TokenService::new(self.config.clone()).issue(&user.user_id);
        Ok(LoginOutput {
            user_id: user.user_id,
            token,
        })
    }
}

//! Register Use Case
//!
//! Creates a new account and signs it in.

use std::sync::Arc;

use kernel::id::UserId;

use crate::application::config::AuthConfig;
use crate::application::token::{IssuedToken, TokenService};
use crate::domain::entity::user::{NewUser, User};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Longest accepted name or city
const MAX_PROFILE_FIELD_LENGTH: usize = 100;

/// Register input
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub address: Option<String>,
}

/// Register output
pub struct RegisterOutput {
    pub user_id: UserId,
    pub token: IssuedToken,
}

/// Register use case
pub struct RegisterUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    config: Arc<AuthConfig>,
}

impl<U> RegisterUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, config: Arc<AuthConfig>) -> Self {
        Self { user_repo, config }
    }

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<RegisterOutput> {
        let email = Email::new(input.email)?;
        let first_name = profile_field("First name", input.first_name)?;
        let last_name = profile_field("Last name", input.last_name)?;
        let city = profile_field("City", input.city)?;
        let address = input
            .address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());

        if self.user_repo.exists_by_email(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let raw_password = RawPassword::new(input.password)?;
        let password = UserPassword::from_raw(&raw_password, self.config.pepper())?;

        let user = User::new(NewUser {
            email,
            password,
            first_name,
            last_name,
            city,
            address,
        });

        // The unique index still decides a concurrent duplicate
        self.user_repo.create(&user).await?;

        tracing::info!(user_id = %user.user_id, city = %user.city, "User registered");

        let token = TokenService::new(self.config.clone()).issue(&user.user_id);
        Ok(RegisterOutput {
            user_id: user.user_id,
            token,
        })
    }
}

fn profile_field(label: &str, value: String) -> AuthResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::Validation(format!("{} cannot be empty", label)));
    }
    if value.chars().count() > MAX_PROFILE_FIELD_LENGTH {
        return Err(AuthError::Validation(format!(
            "{} must be at most {} characters",
            label, MAX_PROFILE_FIELD_LENGTH
        )));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_field_trims() {
        assert_eq!(profile_field("City", "  Zagreb ".to_string()).unwrap(), "Zagreb");
    }

    #[test]
    fn test_profile_field_rejects_blank_and_long() {
        assert!(matches!(
            profile_field("City", "   ".to_string()),
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            profile_field("City", "x".repeat(MAX_PROFILE_FIELD_LENGTH + 1)),
            Err(AuthError::Validation(_))
        ));
    }
}

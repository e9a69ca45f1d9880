//! Verify Address Use Case
//!
//! A moderator confirms a user's address after checking the ID document.

use std::sync::Arc;

use kernel::id::UserId;

use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};

pub struct VerifyAddressUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> VerifyAddressUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn execute(&self, moderator_id: &UserId, user_id: &UserId) -> AuthResult<()> {
        let mut user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !user.verify_address() {
            return Err(AuthError::AddressMissing);
        }

        if !self.user_repo.set_address_verified(user_id).await? {
            // Deleted between the read and the write
            return Err(AuthError::UserNotFound);
        }

        tracing::info!(
            user_id = %user_id,
            moderator_id = %moderator_id,
            "Address verified"
        );
        Ok(())
    }
}

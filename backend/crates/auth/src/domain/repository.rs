//! Repository Traits
//!
//! Identity Store interface. Implementations live in the infra layer.

use kernel::id::UserId;

use crate::domain::entity::user::User;
use crate::domain::value_object::email::Email;
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert a new user. A duplicate email yields `AuthError::EmailTaken`.
    async fn create(&self, user: &User) -> AuthResult<()>;

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// `false` for unknown users.
    async fn is_verified(&self, user_id: &UserId) -> AuthResult<bool>;

    /// `None` for unknown users.
    async fn find_city(&self, user_id: &UserId) -> AuthResult<Option<String>>;

    /// `None` for unknown users.
    async fn find_email(&self, user_id: &UserId) -> AuthResult<Option<Email>>;

    /// Point the address at an uploaded ID document, creating an empty
    /// unverified address when none exists. `false` for unknown users.
    async fn set_id_document(&self, user_id: &UserId, id_url: &str) -> AuthResult<bool>;

    /// Mark an existing address verified. `false` when the user is unknown
    /// or has no address.
    async fn set_address_verified(&self, user_id: &UserId) -> AuthResult<bool>;
}

//! In-memory identity store for tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use kernel::id::UserId;

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<Mutex<HashMap<UserId, User>>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user as-is (role and address included).
    pub fn insert(&self, user: User) {
        self.lock().insert(user.user_id, user);
    }

    pub fn get(&self, user_id: &UserId) -> Option<User> {
        self.lock().get(user_id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, User>> {
        self.users.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let mut users = self.lock();
        if users.values().any(|u| u.email == user.email) {
            return Err(AuthError::EmailTaken);
        }
        users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.get(user_id))
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        Ok(self.lock().values().find(|u| &u.email == email).cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(self.lock().values().any(|u| &u.email == email))
    }

    async fn is_verified(&self, user_id: &UserId) -> AuthResult<bool> {
        Ok(self.lock().get(user_id).is_some_and(User::is_verified))
    }

    async fn find_city(&self, user_id: &UserId) -> AuthResult<Option<String>> {
        Ok(self.lock().get(user_id).map(|u| u.city.clone()))
    }

    async fn find_email(&self, user_id: &UserId) -> AuthResult<Option<Email>> {
        Ok(self.lock().get(user_id).map(|u| u.email.clone()))
    }

    async fn set_id_document(&self, user_id: &UserId, id_url: &str) -> AuthResult<bool> {
        Ok(match self.lock().get_mut(user_id) {
            Some(user) => {
                user.attach_id_document(id_url.to_string());
                true
            }
            None => false,
        })
    }

    async fn set_address_verified(&self, user_id: &UserId) -> AuthResult<bool> {
        Ok(self
            .lock()
            .get_mut(user_id)
            .is_some_and(|user| user.verify_address()))
    }
}

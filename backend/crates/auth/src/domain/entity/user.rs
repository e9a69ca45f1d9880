//! User Entity

use chrono::{DateTime, Utc};
use kernel::id::{PostId, UserId};

use crate::domain::value_object::{
    address::Address, email::Email, user_password::UserPassword, user_role::UserRole,
};

/// Registered account.
///
/// The three post-id lists are back-references kept in step with the
/// vote and favourite sets on posts; the posts store owns their mutation.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    pub email: Email,
    pub password: UserPassword,
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub address: Option<Address>,
    pub profile_pic_url: Option<String>,
    pub upvoted_posts: Vec<PostId>,
    pub downvoted_posts: Vec<PostId>,
    pub favourite_posts: Vec<PostId>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields collected at registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub password: UserPassword,
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub address: Option<String>,
}

impl User {
    /// New account with the `user` role and an unverified address.
    pub fn new(profile: NewUser) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            email: profile.email,
            password: profile.password,
            first_name: profile.first_name,
            last_name: profile.last_name,
            city: profile.city,
            address: profile.address.map(Address::new),
            profile_pic_url: None,
            upvoted_posts: Vec::new(),
            downvoted_posts: Vec::new(),
            favourite_posts: Vec::new(),
            role: UserRole::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the user may report issues.
    pub fn is_verified(&self) -> bool {
        self.address.as_ref().is_some_and(|a| a.verified)
    }

    /// Record an uploaded ID document. Creates an empty, unverified
    /// address when none was given at registration.
    pub fn attach_id_document(&mut self, id_url: String) {
        let address = self.address.get_or_insert_with(|| Address::new(""));
        address.id_url = Some(id_url);
        self.updated_at = Utc::now();
    }

    /// Mark the address verified. Returns `false` when there is no address.
    pub fn verify_address(&mut self) -> bool {
        match self.address.as_mut() {
            Some(address) => {
                address.verified = true;
                self.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    pub fn set_role(&mut self, role: UserRole) {
        self.role = role;
        self.updated_at = Utc::now();
    }
}

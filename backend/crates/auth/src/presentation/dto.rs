//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use kernel::id::{PostId, UserId};
use serde::{Deserialize, Serialize};

use crate::domain::entity::user::User;
use crate::domain::value_object::{address::Address, user_role::UserRole};

// ============================================================================
// Register / Login
// ============================================================================

/// Register request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    #[serde(default)]
    pub address: Option<String>,
}

/// Login request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Register and login response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub id: UserId,
    pub expires_at_ms: i64,
}

// ============================================================================
// Profile
// ============================================================================

/// Caller's own profile. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub address: Option<Address>,
    pub verified: bool,
    pub profile_pic_url: Option<String>,
    pub role: UserRole,
    pub upvoted_posts: Vec<PostId>,
    pub downvoted_posts: Vec<PostId>,
    pub favourite_posts: Vec<PostId>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            verified: user.is_verified(),
            id: user.user_id,
            email: user.email.as_str().to_string(),
            first_name: user.first_name,
            last_name: user.last_name,
            city: user.city,
            address: user.address,
            profile_pic_url: user.profile_pic_url,
            role: user.role,
            upvoted_posts: user.upvoted_posts,
            downvoted_posts: user.downvoted_posts,
            favourite_posts: user.favourite_posts,
            created_at: user.created_at,
        }
    }
}

/// ID document upload response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdDocumentResponse {
    pub id_url: String,
}

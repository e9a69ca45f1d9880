//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::path::PathBuf;
use std::time::Duration;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC-SHA256 key for bearer tokens (32 bytes)
    pub token_secret: [u8; 32],
    /// Bearer token lifetime
    pub token_ttl: Duration,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Directory holding `{user_id}.png` profile pictures
    pub profile_pic_dir: PathBuf,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: [0u8; 32],
            token_ttl: Duration::from_secs(7 * 24 * 3600), // 1 week
            password_pepper: None,
            profile_pic_dir: PathBuf::from("./profile-pics"),
        }
    }
}

impl AuthConfig {
    /// Config with a random token secret. Tokens die with the process.
    pub fn with_random_secret() -> Self {
        Self {
            token_secret: platform::crypto::random_key(),
            ..Default::default()
        }
    }

    /// Create config for development
    pub fn development() -> Self {
        Self {
            token_ttl: Duration::from_secs(24 * 3600),
            ..Self::with_random_secret()
        }
    }

    pub fn token_ttl_ms(&self) -> i64 {
        self.token_ttl.as_millis() as i64
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

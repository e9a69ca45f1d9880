//! Bearer Token Service
//!
//! Stateless tokens: `{user_id}.{expires_at_ms}.{signature}` where the
//! signature is URL-safe base64 of HMAC-SHA256 over `{user_id}.{expires_at_ms}`.

use std::sync::Arc;

use chrono::Utc;
use kernel::id::UserId;
use platform::crypto::{constant_time_eq, from_base64_url, hmac_sha256, to_base64_url};

use crate::application::config::AuthConfig;
use crate::error::{AuthError, AuthResult};

/// Token handed to the client
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at_ms: i64,
}

#[derive(Clone)]
pub struct TokenService {
    config: Arc<AuthConfig>,
}

impl TokenService {
    pub fn new(config: Arc<AuthConfig>) -> Self {
        Self { config }
    }

    pub fn issue(&self, user_id: &UserId) -> IssuedToken {
        self.issue_at(user_id, Utc::now().timestamp_millis())
    }

    pub(crate) fn issue_at(&self, user_id: &UserId, now_ms: i64) -> IssuedToken {
        let expires_at_ms = now_ms + self.config.token_ttl_ms();
        let payload = format!("{}.{}", user_id, expires_at_ms);
        let signature = to_base64_url(&hmac_sha256(&self.config.token_secret, payload.as_bytes()));

        IssuedToken {
            token: format!("{}.{}", payload, signature),
            expires_at_ms,
        }
    }

    /// Resolve the user id a token was issued for.
    pub fn verify(&self, token: &str) -> AuthResult<UserId> {
        self.verify_at(token, Utc::now().timestamp_millis())
    }

    pub(crate) fn verify_at(&self, token: &str, now_ms: i64) -> AuthResult<UserId> {
        let (payload, signature_b64) = token.rsplit_once('.').ok_or(AuthError::TokenInvalid)?;
        let (user_id_str, expires_str) = payload.split_once('.').ok_or(AuthError::TokenInvalid)?;

        let signature = from_base64_url(signature_b64).map_err(|_| AuthError::TokenInvalid)?;
        let expected = hmac_sha256(&self.config.token_secret, payload.as_bytes());
        if !constant_time_eq(&signature, &expected) {
            return Err(AuthError::TokenInvalid);
        }

        let expires_at_ms: i64 = expires_str.parse().map_err(|_| AuthError::TokenInvalid)?;
        if expires_at_ms <= now_ms {
            return Err(AuthError::TokenExpired);
        }

        UserId::parse(user_id_str).ok_or(AuthError::TokenInvalid)
    }
}

//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations with no knowledge of users or posts:
//! - Cryptographic helpers (HMAC-SHA256, URL-safe Base64, random bytes)
//! - Password hashing (Argon2id, NIST SP 800-63B policy)
//! - Bearer token extraction from request headers
//! - Blob storage contract with filesystem and S3 backends
//! - Outbound mail (SMTP or log-only)

pub mod bearer;
pub mod crypto;
pub mod mail;
pub mod password;
pub mod storage;

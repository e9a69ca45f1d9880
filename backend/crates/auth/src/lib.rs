//! Identity Store and bearer-token authentication
//!
//! Clean Architecture structure:
//! - `domain/` - user entity, value objects, repository trait
//! - `application/` - registration, login, token service, address verification
//! - `infra/` - PostgreSQL (and, for tests, in-memory) repositories
//! - `presentation/` - `/users` handlers, bearer middleware, role guard
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (optional pepper)
//! - Stateless bearer tokens: `{user_id}.{expires_at_ms}.{HMAC-SHA256}`
//! - Roles (`user`, `moderator`, `local-admin`) are distinct scopes

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::AuthConfig;
pub use domain::entity::user::User;
pub use domain::repository::UserRepository;
pub use domain::value_object::user_role::UserRole;
pub use error::{AuthError, AuthResult};
pub use application::token::TokenService;
#[cfg(any(test, feature = "testing"))]
pub use infra::memory::MemoryUserRepository;
pub use infra::postgres::PgAuthRepository;
pub use presentation::middleware::{AuthMiddlewareState, AuthUser, require_bearer};
pub use presentation::router::{users_router, users_router_generic};

pub use kernel::id::UserId;

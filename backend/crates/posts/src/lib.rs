//! Civic issue reports
//!
//! Clean Architecture structure:
//! - `domain/` - post entity, status/sort/pagination value objects, repository trait
//! - `application/` - lifecycle, moderation, votes, attachments, listings
//! - `infra/` - PostgreSQL (and, for tests, in-memory) repositories
//! - `presentation/` - `/posts` handlers and router
//!
//! ## Consistency Model
//! - A vote or favourite toggle updates the post and the voter in one transaction
//! - Up and down votes of one user on one post are mutually exclusive
//! - Blob cleanup and rejection mail run after the response, on spawned tasks

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::attachments::AttachmentManager;
pub use application::config::PostsConfig;
pub use domain::entity::post::Post;
pub use domain::repository::PostRepository;
pub use domain::value_object::post_sort::PostSort;
pub use domain::value_object::post_status::PostStatus;
pub use error::{PostError, PostResult};
#[cfg(any(test, feature = "testing"))]
pub use infra::memory::MemoryPostRepository;
pub use infra::postgres::PgPostRepository;
pub use presentation::router::{posts_router, posts_router_generic};

pub use kernel::id::PostId;

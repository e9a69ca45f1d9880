//! Presentation Layer
//!
//! HTTP handlers, DTOs and router for `/posts`.

pub mod dto;
pub mod handlers;
pub mod router;

pub use handlers::PostAppState;
pub use router::{posts_router, posts_router_generic};

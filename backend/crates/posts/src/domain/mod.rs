//! Domain Layer
//!
//! Post entity, value objects and the Post store port.

pub mod entity;
pub mod repository;
pub mod value_object;

pub use entity::post::Post;
pub use repository::PostRepository;

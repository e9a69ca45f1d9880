//! Infrastructure Layer
//!
//! Post store implementations.

#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod postgres;

#[cfg(any(test, feature = "testing"))]
pub use memory::MemoryPostRepository;
pub use postgres::PgPostRepository;

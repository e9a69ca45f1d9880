//! Infrastructure Layer
//!
//! Database implementations of the identity store.

#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod postgres;

#[cfg(any(test, feature = "testing"))]
pub use memory::MemoryUserRepository;
pub use postgres::PgAuthRepository;

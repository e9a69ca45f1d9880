//! Shared Kernel
//!
//! Vocabulary every crate in the workspace agrees on:
//! - the error taxonomy ([`error::kind::ErrorKind`]) and the unified
//!   [`error::app_error::AppError`] rendered at the HTTP edge
//! - typed identifiers ([`id::UserId`], [`id::PostId`])
//!
//! Only things with the same meaning in every domain belong here.

pub mod error {
    pub mod app_error;
    pub mod kind;
}
pub mod id;

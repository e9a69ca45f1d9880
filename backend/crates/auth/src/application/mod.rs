//! Application Layer
//!
//! Use cases and application services.

pub mod authenticate;
pub mod config;
pub mod id_document;
pub mod login;
pub mod profile;
pub mod register;
pub mod token;
pub mod verify_address;

// Re-exports
pub use authenticate::AuthenticateUseCase;
pub use config::AuthConfig;
pub use id_document::{IdDocument, IdDocumentInput, ReadIdDocumentUseCase, UploadIdDocumentUseCase};
pub use login::{LoginInput, LoginUseCase};
pub use profile::GetProfileUseCase;
pub use register::{RegisterInput, RegisterUseCase};
pub use token::{IssuedToken, TokenService};
pub use verify_address::VerifyAddressUseCase;

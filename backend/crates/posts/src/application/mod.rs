//! Application Layer
//!
//! Use cases of the post lifecycle, vote aggregation, attachments and
//! listings.

pub mod attachments;
pub mod config;
pub mod lifecycle;
pub mod query;
pub mod removal;
pub mod votes;

// Re-exports
pub use attachments::{AttachmentManager, ReplaceOutput, UploadedFile};
pub use config::PostsConfig;
pub use lifecycle::{
    ChangeStatusUseCase, CreatePostInput, CreatePostUseCase, EditPostInput, EditPostUseCase,
    GetPostUseCase, VerifyPostUseCase,
};
pub use query::{ListPostsUseCase, PostPage};
pub use removal::{DeletePostUseCase, DenyPostUseCase};
pub use votes::VoteUseCase;

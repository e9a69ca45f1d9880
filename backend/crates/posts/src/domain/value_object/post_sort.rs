//! Post Sort Value Object

use std::str::FromStr;

use crate::domain::value_object::post_status::PostStatus;
use crate::error::PostError;

/// Listing order. Every order ends with newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostSort {
    /// Newest first
    #[default]
    Date,
    /// Most upvoted first
    Upvotes,
    /// Most downvoted first
    Downvotes,
    /// Posts in the given status first
    Status(PostStatus),
}

impl PostSort {
    /// Absent means date; anything unrecognized is rejected.
    pub fn parse(value: Option<&str>) -> Result<Self, PostError> {
        match value.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(v) => v.parse(),
        }
    }
}

impl FromStr for PostSort {
    type Err = PostError;

    /// Accepts `date`, `upvotes`, `downvotes` and a status, either bare
    /// (`seen`) or prefixed (`status-seen`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(Self::Date),
            "upvotes" => Ok(Self::Upvotes),
            "downvotes" => Ok(Self::Downvotes),
            other => {
                let code = other.strip_prefix("status-").unwrap_or(other);
                PostStatus::from_code(code)
                    .map(Self::Status)
                    .ok_or_else(|| PostError::InvalidArgument(format!("Unknown sort key '{}'", s)))
            }
        }
    }
}

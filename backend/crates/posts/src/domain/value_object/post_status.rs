//! Post Status Value Object

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PostError;

/// Workflow stage of a reported issue.
///
/// Independent of moderation: any status may follow any other, and a post
/// keeps its status when it is approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(i16)]
pub enum PostStatus {
    #[default]
    Sent = 0,
    Seen = 1,
    InProgress = 2,
    Resolved = 3,
}

impl PostStatus {
    pub const ALL: [PostStatus; 4] = [
        PostStatus::Sent,
        PostStatus::Seen,
        PostStatus::InProgress,
        PostStatus::Resolved,
    ];

    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        use PostStatus::*;
        match self {
            Sent => "sent",
            Seen => "seen",
            InProgress => "in-progress",
            Resolved => "resolved",
        }
    }

    #[inline]
    pub fn from_id(id: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for PostStatus {
    type Err = PostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
            .ok_or_else(|| PostError::InvalidArgument(format!("Unknown post status '{}'", s)))
    }
}

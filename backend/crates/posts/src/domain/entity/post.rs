//! Post Entity

use chrono::{DateTime, Utc};
use kernel::id::{PostId, UserId};

use crate::domain::value_object::outcome::{
    FavouriteOutcome, VoteKind, VoteOutcome, vote_transition,
};
use crate::domain::value_object::post_status::PostStatus;

/// Most files a post may carry
pub const MAX_POST_FILES: usize = 4;

/// A reported civic issue.
///
/// `upvoted_by` and `downvoted_by` never share a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub post_id: PostId,
    pub title: String,
    pub description: String,
    pub owner_id: UserId,
    pub city: String,
    pub status: PostStatus,
    pub upvoted_by: Vec<UserId>,
    pub downvoted_by: Vec<UserId>,
    pub favourite_by: Vec<UserId>,
    pub file_urls: Vec<String>,
    /// Approved by a moderator for public listings
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Fresh report: `sent`, unverified, no votes and no files.
    pub fn new(title: String, description: String, owner_id: UserId, city: String) -> Self {
        let now = Utc::now();

        Self {
            post_id: PostId::new(),
            title,
            description,
            owner_id,
            city,
            status: PostStatus::default(),
            upvoted_by: Vec::new(),
            downvoted_by: Vec::new(),
            favourite_by: Vec::new(),
            file_urls: Vec::new(),
            verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.owner_id == *user_id
    }

    /// Toggle `user_id`'s vote of `kind`, withdrawing the opposite vote.
    pub fn toggle_vote(&mut self, user_id: UserId, kind: VoteKind) -> VoteOutcome {
        let transition = vote_transition(
            kind,
            self.upvoted_by.contains(&user_id),
            self.downvoted_by.contains(&user_id),
        );
        set_member(&mut self.upvoted_by, user_id, transition.upvoted);
        set_member(&mut self.downvoted_by, user_id, transition.downvoted);
        self.updated_at = Utc::now();
        transition.outcome
    }

    pub fn toggle_favourite(&mut self, user_id: UserId) -> FavouriteOutcome {
        let outcome = if remove(&mut self.favourite_by, &user_id) {
            FavouriteOutcome::Removed
        } else {
            self.favourite_by.push(user_id);
            FavouriteOutcome::Added
        };
        self.updated_at = Utc::now();
        outcome
    }
}

fn set_member(set: &mut Vec<UserId>, user_id: UserId, member: bool) {
    if member {
        if !set.contains(&user_id) {
            set.push(user_id);
        }
    } else {
        set.retain(|id| *id != user_id);
    }
}

fn remove(set: &mut Vec<UserId>, user_id: &UserId) -> bool {
    let before = set.len();
    set.retain(|id| id != user_id);
    set.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> Post {
        Post::new(
            "Pothole".to_string(),
            "Deep pothole on Main Street".to_string(),
            UserId::new(),
            "Zagreb".to_string(),
        )
    }

    #[test]
    fn test_new_post_defaults() {
        let post = post();
        assert_eq!(post.status, PostStatus::Sent);
        assert!(!post.verified);
        assert!(post.file_urls.is_empty());
    }

    #[test]
    fn test_vote_toggle_roundtrip() {
        let mut post = post();
        let voter = UserId::new();

        assert_eq!(post.toggle_vote(voter, VoteKind::Up), VoteOutcome::Added);
        assert_eq!(post.toggle_vote(voter, VoteKind::Up), VoteOutcome::Removed);
        assert!(post.upvoted_by.is_empty());
        assert!(post.downvoted_by.is_empty());
    }

    #[test]
    fn test_vote_mutual_exclusion() {
        let mut post = post();
        let voter = UserId::new();

        post.toggle_vote(voter, VoteKind::Down);
        assert_eq!(
            post.toggle_vote(voter, VoteKind::Up),
            VoteOutcome::AddedAndOppositeRemoved
        );
        assert_eq!(post.upvoted_by, vec![voter]);
        assert!(post.downvoted_by.is_empty());
    }

    #[test]
    fn test_favourite_independent_of_votes() {
        let mut post = post();
        let user = UserId::new();
        post.toggle_vote(user, VoteKind::Up);

        assert_eq!(post.toggle_favourite(user), FavouriteOutcome::Added);
        assert_eq!(post.toggle_favourite(user), FavouriteOutcome::Removed);
        assert!(post.favourite_by.is_empty());
        assert_eq!(post.upvoted_by, vec![user]);
    }
}

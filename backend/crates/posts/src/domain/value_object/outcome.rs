//! Toggle and owner-gated write outcomes

use serde::Serialize;

/// Which vote set a toggle targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteKind {
    Up,
    Down,
}

impl VoteKind {
    pub const fn opposite(self) -> Self {
        match self {
            VoteKind::Up => VoteKind::Down,
            VoteKind::Down => VoteKind::Up,
        }
    }

    pub const fn noun(self) -> &'static str {
        match self {
            VoteKind::Up => "upvote",
            VoteKind::Down => "downvote",
        }
    }
}

/// Vote membership of one user after a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteTransition {
    pub outcome: VoteOutcome,
    pub upvoted: bool,
    pub downvoted: bool,
}

/// Toggle `kind` for a user currently `upvoted` and/or `downvoted`.
///
/// Adding a vote always withdraws the opposite one, so the user never
/// ends up in both sets.
pub fn vote_transition(kind: VoteKind, upvoted: bool, downvoted: bool) -> VoteTransition {
    let (same, opposite) = match kind {
        VoteKind::Up => (upvoted, downvoted),
        VoteKind::Down => (downvoted, upvoted),
    };

    let (outcome, same, opposite) = if same {
        (VoteOutcome::Removed, false, false)
    } else if opposite {
        (VoteOutcome::AddedAndOppositeRemoved, true, false)
    } else {
        (VoteOutcome::Added, true, false)
    };

    let (upvoted, downvoted) = match kind {
        VoteKind::Up => (same, opposite),
        VoteKind::Down => (opposite, same),
    };
    VoteTransition {
        outcome,
        upvoted,
        downvoted,
    }
}

/// Result of an upvote or downvote toggle on an existing post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VoteOutcome {
    Added,
    /// Added, and the caller's opposite vote was withdrawn
    AddedAndOppositeRemoved,
    Removed,
}

impl VoteOutcome {
    /// "added upvote", "added upvote and removed downvote", "removed upvote"
    pub fn message(self, kind: VoteKind) -> String {
        match self {
            VoteOutcome::Added => format!("added {}", kind.noun()),
            VoteOutcome::AddedAndOppositeRemoved => format!(
                "added {} and removed {}",
                kind.noun(),
                kind.opposite().noun()
            ),
            VoteOutcome::Removed => format!("removed {}", kind.noun()),
        }
    }
}

/// Result of a favourite toggle on an existing post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FavouriteOutcome {
    Added,
    Removed,
}

impl FavouriteOutcome {
    pub fn message(self) -> &'static str {
        match self {
            FavouriteOutcome::Added => "added to favourites",
            FavouriteOutcome::Removed => "removed from favourites",
        }
    }
}

/// Result of a write only the owner may perform.
///
/// `NotFound` and `Forbidden` stay distinct: a non-owner touching an
/// existing post is always `Forbidden`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnedWrite<T = ()> {
    Applied(T),
    NotFound,
    Forbidden,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_messages() {
        assert_eq!(VoteOutcome::Added.message(VoteKind::Up), "added upvote");
        assert_eq!(
            VoteOutcome::AddedAndOppositeRemoved.message(VoteKind::Up),
            "added upvote and removed downvote"
        );
        assert_eq!(
            VoteOutcome::AddedAndOppositeRemoved.message(VoteKind::Down),
            "added downvote and removed upvote"
        );
        assert_eq!(VoteOutcome::Removed.message(VoteKind::Down), "removed downvote");
    }

    #[test]
    fn test_vote_transitions() {
        let t = vote_transition(VoteKind::Up, false, false);
        assert_eq!((t.outcome, t.upvoted, t.downvoted), (VoteOutcome::Added, true, false));

        let t = vote_transition(VoteKind::Up, true, false);
        assert_eq!((t.outcome, t.upvoted, t.downvoted), (VoteOutcome::Removed, false, false));

        let t = vote_transition(VoteKind::Up, false, true);
        assert_eq!(
            (t.outcome, t.upvoted, t.downvoted),
            (VoteOutcome::AddedAndOppositeRemoved, true, false)
        );

        let t = vote_transition(VoteKind::Down, true, false);
        assert_eq!(
            (t.outcome, t.upvoted, t.downvoted),
            (VoteOutcome::AddedAndOppositeRemoved, false, true)
        );
    }

    #[test]
    fn test_favourite_messages() {
        assert_eq!(FavouriteOutcome::Added.message(), "added to favourites");
        assert_eq!(FavouriteOutcome::Removed.message(), "removed from favourites");
    }
}

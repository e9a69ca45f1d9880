//! In-memory post store for tests

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use auth::MemoryUserRepository;
use kernel::id::{PostId, UserId};

use crate::domain::entity::post::Post;
use crate::domain::repository::{PostFilter, PostRepository, Window};
use crate::domain::value_object::outcome::{FavouriteOutcome, OwnedWrite, VoteKind, VoteOutcome};
use crate::domain::value_object::post_sort::PostSort;
use crate::domain::value_object::post_status::PostStatus;
use crate::error::PostResult;

/// Posts in a map. Clones share the same map.
///
/// With [`MemoryPostRepository::with_users`] the voters' back-reference
/// lists are kept in step, as the Postgres store does.
#[derive(Debug, Clone, Default)]
pub struct MemoryPostRepository {
    posts: Arc<Mutex<BTreeMap<PostId, Post>>>,
    users: Option<MemoryUserRepository>,
}

impl MemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: MemoryUserRepository) -> Self {
        Self {
            posts: Arc::default(),
            users: Some(users),
        }
    }

    pub fn get(&self, post_id: &PostId) -> Option<Post> {
        self.lock().get(post_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PostId, Post>> {
        self.posts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Apply `edit` to the user's post-id lists, if users are tracked.
    fn update_back_refs(&self, user_id: &UserId, edit: impl FnOnce(&mut auth::User)) {
        let Some(users) = &self.users else {
            return;
        };
        if let Some(mut user) = users.get(user_id) {
            edit(&mut user);
            users.insert(user);
        }
    }
}

fn matches(filter: &PostFilter, post: &Post) -> bool {
    match filter {
        PostFilter::Verified => post.verified,
        PostFilter::VerifiedInCity(city) => post.verified && post.city == *city,
        PostFilter::UnverifiedInCity(city) => !post.verified && post.city == *city,
        PostFilter::OwnedBy(user_id) => post.owner_id == *user_id,
        PostFilter::FavouriteOf(user_id) => post.favourite_by.contains(user_id),
    }
}

fn compare(sort: PostSort, a: &Post, b: &Post) -> Ordering {
    let primary = match sort {
        PostSort::Date => Ordering::Equal,
        PostSort::Upvotes => b.upvoted_by.len().cmp(&a.upvoted_by.len()),
        PostSort::Downvotes => b.downvoted_by.len().cmp(&a.downvoted_by.len()),
        PostSort::Status(status) => (b.status == status).cmp(&(a.status == status)),
    };

    primary
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.post_id.cmp(&b.post_id))
}

fn set_membership(list: &mut Vec<PostId>, post_id: PostId, member: bool) {
    list.retain(|id| *id != post_id);
    if member {
        list.push(post_id);
    }
}

impl PostRepository for MemoryPostRepository {
    async fn insert(&self, post: &Post) -> PostResult<()> {
        self.lock().insert(post.post_id, post.clone());
        Ok(())
    }

    async fn find_by_id(&self, post_id: &PostId) -> PostResult<Option<Post>> {
        Ok(self.get(post_id))
    }

    async fn update_content(
        &self,
        post_id: &PostId,
        requester: &UserId,
        title: &str,
        description: &str,
    ) -> PostResult<OwnedWrite> {
        let mut posts = self.lock();
        let Some(post) = posts.get_mut(post_id) else {
            return Ok(OwnedWrite::NotFound);
        };
        if !post.is_owned_by(requester) {
            return Ok(OwnedWrite::Forbidden);
        }
        post.title = title.to_string();
        post.description = description.to_string();
        post.updated_at = chrono::Utc::now();
        Ok(OwnedWrite::Applied(()))
    }

    async fn set_status(&self, post_id: &PostId, status: PostStatus) -> PostResult<bool> {
        Ok(match self.lock().get_mut(post_id) {
            Some(post) => {
                post.status = status;
                post.updated_at = chrono::Utc::now();
                true
            }
            None => false,
        })
    }

    async fn set_verified(&self, post_id: &PostId) -> PostResult<bool> {
        Ok(match self.lock().get_mut(post_id) {
            Some(post) => {
                post.verified = true;
                post.updated_at = chrono::Utc::now();
                true
            }
            None => false,
        })
    }

    async fn delete(
        &self,
        post_id: &PostId,
        requester: Option<&UserId>,
    ) -> PostResult<OwnedWrite<Post>> {
        let post = {
            let mut posts = self.lock();
            let owned = match posts.get(post_id) {
                None => return Ok(OwnedWrite::NotFound),
                Some(post) => requester.is_none_or(|r| post.is_owned_by(r)),
            };
            if !owned {
                return Ok(OwnedWrite::Forbidden);
            }
            match posts.remove(post_id) {
                Some(post) => post,
                None => return Ok(OwnedWrite::NotFound),
            }
        };

        let referencing = post
            .upvoted_by
            .iter()
            .chain(&post.downvoted_by)
            .chain(&post.favourite_by);
        for user_id in referencing {
            self.update_back_refs(user_id, |user| {
                user.upvoted_posts.retain(|id| id != post_id);
                user.downvoted_posts.retain(|id| id != post_id);
                user.favourite_posts.retain(|id| id != post_id);
            });
        }

        Ok(OwnedWrite::Applied(post))
    }

    async fn toggle_vote(
        &self,
        post_id: &PostId,
        user_id: &UserId,
        kind: VoteKind,
    ) -> PostResult<Option<VoteOutcome>> {
        // Back-refs change under the posts lock
        let mut posts = self.lock();
        let Some(post) = posts.get_mut(post_id) else {
            return Ok(None);
        };
        let outcome = post.toggle_vote(*user_id, kind);
        let upvoted = post.upvoted_by.contains(user_id);
        let downvoted = post.downvoted_by.contains(user_id);

        self.update_back_refs(user_id, |user| {
            set_membership(&mut user.upvoted_posts, *post_id, upvoted);
            set_membership(&mut user.downvoted_posts, *post_id, downvoted);
        });
        drop(posts);

        Ok(Some(outcome))
    }

    async fn toggle_favourite(
        &self,
        post_id: &PostId,
        user_id: &UserId,
    ) -> PostResult<Option<FavouriteOutcome>> {
        let mut posts = self.lock();
        let Some(post) = posts.get_mut(post_id) else {
            return Ok(None);
        };
        let outcome = post.toggle_favourite(*user_id);

        self.update_back_refs(user_id, |user| {
            set_membership(
                &mut user.favourite_posts,
                *post_id,
                outcome == FavouriteOutcome::Added,
            );
        });
        drop(posts);

        Ok(Some(outcome))
    }

    async fn clear_file_urls(&self, post_id: &PostId) -> PostResult<bool> {
        Ok(match self.lock().get_mut(post_id) {
            Some(post) => {
                post.file_urls.clear();
                true
            }
            None => false,
        })
    }

    async fn append_file_urls(&self, post_id: &PostId, urls: &[String]) -> PostResult<bool> {
        Ok(match self.lock().get_mut(post_id) {
            Some(post) => {
                post.file_urls.extend_from_slice(urls);
                true
            }
            None => false,
        })
    }

    async fn list(
        &self,
        filter: &PostFilter,
        sort: PostSort,
        window: Option<Window>,
    ) -> PostResult<Vec<Post>> {
        let mut posts: Vec<Post> = self
            .lock()
            .values()
            .filter(|post| matches(filter, post))
            .cloned()
            .collect();
        posts.sort_by(|a, b| compare(sort, a, b));

        Ok(match window {
            Some(Window { offset, limit }) => posts
                .into_iter()
                .skip(usize::try_from(offset).unwrap_or(usize::MAX))
                .take(usize::try_from(limit).unwrap_or(0))
                .collect(),
            None => posts,
        })
    }

    async fn count(&self, filter: &PostFilter) -> PostResult<i64> {
        let count = self.lock().values().filter(|post| matches(filter, post)).count();
        Ok(count as i64)
    }
}

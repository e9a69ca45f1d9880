//! Query/Pagination Layer
//!
//! Read-only listings. Public listings only ever show approved posts.

use std::sync::Arc;

use auth::UserRepository;
use kernel::id::UserId;

use crate::domain::entity::post::Post;
use crate::domain::repository::{PostFilter, PostRepository, Window};
use crate::domain::value_object::page::{PageLinks, PageRequest};
use crate::domain::value_object::post_sort::PostSort;
use crate::error::{PostError, PostResult};

/// One page of posts, or all of them when no page was requested
#[derive(Debug, Clone)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub links: PageLinks,
}

pub struct ListPostsUseCase<P, U>
where
    P: PostRepository,
    U: UserRepository,
{
    post_repo: Arc<P>,
    user_repo: Arc<U>,
}

impl<P, U> ListPostsUseCase<P, U>
where
    P: PostRepository,
    U: UserRepository,
{
    pub fn new(post_repo: Arc<P>, user_repo: Arc<U>) -> Self {
        Self {
            post_repo,
            user_repo,
        }
    }

    /// Every approved post, optionally one page of them.
    pub async fn list_all(&self, page: Option<PageRequest>, sort: PostSort) -> PostResult<PostPage> {
        let filter = PostFilter::Verified;

        let Some(page) = page else {
            let posts = self.post_repo.list(&filter, sort, None).await?;
            return Ok(PostPage {
                posts,
                links: PageLinks::default(),
            });
        };

        let total = self.post_repo.count(&filter).await?;
        let links = page.links(total)?;
        let window = Window {
            offset: page.start_index()?,
            limit: page.limit,
        };
        let posts = self.post_repo.list(&filter, sort, Some(window)).await?;

        Ok(PostPage { posts, links })
    }

    pub async fn list_by_city(&self, city: &str, sort: PostSort) -> PostResult<Vec<Post>> {
        self.post_repo
            .list(&PostFilter::VerifiedInCity(city.trim().to_string()), sort, None)
            .await
    }

    /// The caller's own reports, approved or not.
    pub async fn list_by_user(&self, user_id: &UserId) -> PostResult<Vec<Post>> {
        self.post_repo
            .list(&PostFilter::OwnedBy(*user_id), PostSort::Date, None)
            .await
    }

    pub async fn list_favourites(&self, user_id: &UserId) -> PostResult<Vec<Post>> {
        self.post_repo
            .list(&PostFilter::FavouriteOf(*user_id), PostSort::Date, None)
            .await
    }

    /// Reports awaiting moderation in the moderator's city.
    pub async fn list_unverified_for_moderator(&self, moderator_id: &UserId) -> PostResult<Vec<Post>> {
        let city = self
            .user_repo
            .find_city(moderator_id)
            .await?
            .ok_or(PostError::NotFound)?;

        if city.trim().is_empty() {
            return Ok(Vec::new());
        }

        self.post_repo
            .list(&PostFilter::UnverifiedInCity(city), PostSort::Date, None)
            .await
    }
}
